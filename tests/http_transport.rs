//! HTTP transport tests against a mockito server.

#![cfg(feature = "http-client")]

use mockito::Matcher;
use serde_json::json;

use octopus_client::transport::http::HttpLinkClient;
use octopus_client::{
    ClientConfig, Error, HealthCheckOptions, LinkClient, QueryParameters, TaskRepository,
    TaskState, TransportError,
};

fn client_for(server: &mockito::ServerGuard) -> HttpLinkClient {
    let config = ClientConfig::new(server.url()).with_header("X-Octopus-ApiKey", "API-TEST");
    HttpLinkClient::new(&config).unwrap()
}

// ─── Requests ───────────────────────────────────────────────────────────────

mod request_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_get_strips_template_and_sends_query_and_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/tasks/ServerTasks-1/details")
            .match_header("X-Octopus-ApiKey", "API-TEST")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("spaces".into(), "Spaces-1".into()),
                Matcher::UrlEncoded("tail".into(), "10".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Task":{"Id":"ServerTasks-1","Name":"Health"}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let value = client
            .get(
                "/api/tasks/ServerTasks-1/details{?verbose,tail}",
                &QueryParameters::new().with("spaces", "Spaces-1").with("tail", 10),
            )
            .await
            .unwrap();

        assert_eq!(value["Task"]["Id"], "ServerTasks-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_text_returns_raw_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tasks/ServerTasks-1/raw")
            .with_status(200)
            .with_body("line one\nline two\n")
            .create_async()
            .await;

        let text = client_for(&server)
            .get_text("/api/tasks/ServerTasks-1/raw", &QueryParameters::new())
            .await
            .unwrap();
        assert_eq!(text, "line one\nline two\n");
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/tasks/ServerTasks-1/state")
            .match_body(Matcher::Json(json!({ "state": "Failed", "reason": "stuck" })))
            .with_status(200)
            .create_async()
            .await;

        client_for(&server)
            .post(
                "/api/tasks/ServerTasks-1/state",
                Some(&json!({ "state": "Failed", "reason": "stuck" })),
            )
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/tasks/ServerTasks-1/cancel")
            .with_status(404)
            .with_body("not found")
            .create_async()
            .await;

        let err = client_for(&server)
            .post("/api/tasks/ServerTasks-1/cancel", None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::Http {
                status: 404,
                body: "not found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_deserialization_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tasks/ServerTasks-1")
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let err = client_for(&server)
            .get("/api/tasks/ServerTasks-1", &QueryParameters::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Deserialization(_)), "{err:?}");
    }
}

// ─── Pagination ─────────────────────────────────────────────────────────────

mod pagination_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_list_all_follows_next_page_links() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/api/tasks")
            .match_query(Matcher::UrlEncoded("active".into(), "true".into()))
            .with_status(200)
            .with_body(
                json!({
                    "Items": [{ "Id": "ServerTasks-1" }, { "Id": "ServerTasks-2" }],
                    "Links": { "Page.Next": "/api/tasks/page-2{?skip,take}" }
                })
                .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/api/tasks/page-2")
            .with_status(200)
            .with_body(json!({ "Items": [{ "Id": "ServerTasks-3" }], "Links": {} }).to_string())
            .create_async()
            .await;

        let items = client_for(&server)
            .list_all("/api/tasks", &QueryParameters::new().with("active", true))
            .await
            .unwrap();

        let ids: Vec<_> = items.iter().map(|i| i["Id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["ServerTasks-1", "ServerTasks-2", "ServerTasks-3"]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_all_stops_on_repeated_next_link() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/tasks/loop")
            .with_status(200)
            .with_body(
                json!({
                    "Items": [{ "Id": "ServerTasks-1" }],
                    "Links": { "Page.Next": "/api/tasks/loop" }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let items = client_for(&server)
            .list_all("/api/tasks/loop", &QueryParameters::new())
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        mock.assert_async().await;
    }
}

// ─── Repository Over HTTP ───────────────────────────────────────────────────

mod repository_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_health_check_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/api/Spaces-1/tasks")
            .match_body(Matcher::PartialJson(json!({
                "Name": "Health",
                "SpaceId": "Spaces-1",
                "Arguments": { "Timeout": "00:05:00", "MachineIds": ["m1", "w1"] }
            })))
            .with_status(201)
            .with_body(
                json!({
                    "Id": "ServerTasks-10",
                    "Name": "Health",
                    "Description": "Manual health check",
                    "SpaceId": "Spaces-1",
                    "State": "Queued",
                    "IsCompleted": false,
                    "Links": { "Self": "/api/Spaces-1/tasks/ServerTasks-10" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let config = ClientConfig::new(server.url()).with_spaces(["Spaces-1"]);
        let repository = TaskRepository::from_config(&config).unwrap();
        let task = repository
            .execute_health_check(
                HealthCheckOptions::default()
                    .with_machine_ids(["m1"])
                    .with_worker_ids(["w1"]),
            )
            .await
            .unwrap();

        assert_eq!(task.id.as_deref(), Some("ServerTasks-10"));
        assert_eq!(task.state, TaskState::Queued);
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_errors_surface_as_transport_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/tasks")
            .with_status(500)
            .with_body("backup already running")
            .create_async()
            .await;

        let repository = TaskRepository::from_config(&ClientConfig::new(server.url())).unwrap();
        let err = repository.execute_backup(None).await.unwrap_err();
        assert!(
            matches!(
                err,
                Error::Transport(TransportError::Http { status: 500, ref body }) if body == "backup already running"
            ),
            "{err:?}"
        );
    }
}
