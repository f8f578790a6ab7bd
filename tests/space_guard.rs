//! Table tests for space context checks.

use std::sync::Arc;

use rstest::rstest;

use octopus_client::{Error, SpaceContext, SpaceGuard, TaskResource};

fn task_in(space_id: Option<&str>) -> TaskResource {
    TaskResource {
        id: Some("ServerTasks-1".to_string()),
        space_id: space_id.map(String::from),
        ..TaskResource::new("Health", "Manual health check")
    }
}

fn context(ids: Option<&[&str]>) -> SpaceContext {
    match ids {
        Some(ids) => SpaceContext::specific(ids.iter().copied()),
        None => SpaceContext::AllSpaces,
    }
}

#[rstest]
#[case::system_task_restricted(None, Some(&["S1"][..]), true)]
#[case::system_task_unrestricted(None, None, true)]
#[case::member(Some("S1"), Some(&["S1", "S2"][..]), true)]
#[case::unrestricted(Some("S9"), None, true)]
#[case::not_a_member(Some("S1"), Some(&["S2"][..]), false)]
#[case::empty_context(Some("S1"), Some(&[][..]), false)]
#[case::case_sensitive(Some("s1"), Some(&["S1"][..]), false)]
fn test_authorize(
    #[case] task_space: Option<&str>,
    #[case] selected: Option<&[&str]>,
    #[case] allowed: bool,
) {
    let guard = SpaceGuard::new(Arc::new(context(selected)));
    let result = guard.authorize(&task_in(task_space));
    if allowed {
        assert!(result.is_ok(), "expected success, got: {result:?}");
    } else {
        assert!(
            matches!(result, Err(Error::OutOfScope { .. })),
            "expected OutOfScope, got: {result:?}"
        );
    }
}

#[rstest]
#[case::all_spaces(None, None)]
#[case::none_selected(Some(&[][..]), None)]
#[case::one_selected(Some(&["S1"][..]), Some("S1"))]
#[case::duplicates_collapse(Some(&["S1", "S1"][..]), Some("S1"))]
#[case::two_selected(Some(&["S1", "S2"][..]), None)]
fn test_require_single_space(#[case] selected: Option<&[&str]>, #[case] expected: Option<&str>) {
    let guard = SpaceGuard::new(Arc::new(context(selected)));
    match (guard.require_single_space(), expected) {
        (Ok(space), Some(expected)) => assert_eq!(space, expected),
        (Err(Error::AmbiguousSpace { .. }), None) => {}
        (other, expected) => panic!("expected {expected:?}, got: {other:?}"),
    }
}

#[rstest]
#[case::all_spaces(None, "all spaces", "all")]
#[case::one(Some(&["Spaces-1"][..]), "Spaces-1", "Spaces-1")]
#[case::many(Some(&["Spaces-1", "Spaces-2"][..]), "Spaces-1, Spaces-2", "Spaces-1,Spaces-2")]
fn test_context_rendering(
    #[case] selected: Option<&[&str]>,
    #[case] display: &str,
    #[case] query: &str,
) {
    let guard = SpaceGuard::new(Arc::new(context(selected)));
    assert_eq!(guard.context().to_string(), display);
    assert_eq!(guard.query_parameters().get("spaces"), Some(query));
}

#[test]
fn test_ambiguous_space_message_names_context() {
    let guard = SpaceGuard::new(Arc::new(SpaceContext::specific(["S1", "S2"])));
    let err = guard.require_single_space().unwrap_err();
    assert!(err.to_string().ends_with("current space context is: S1, S2"), "{err}");
}
