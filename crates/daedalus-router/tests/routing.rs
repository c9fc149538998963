use daedalus_router::{Lookup, MethodSet, Router};
use http::Method;
use proptest::prelude::*;

fn found<'a>(router: &'a Router<&'static str>, method: &Method, path: &str) -> Option<(&'static str, Vec<(String, String)>)> {
    match router.lookup(method, path) {
        Lookup::Found(m) => Some((
            *m.value,
            m.params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )),
        _ => None,
    }
}

#[test]
fn mixed_route_table() {
    let mut router = Router::new();
    router.insert(&Method::GET.into(), "/api/v1/users", "listUsers").unwrap();
    router.insert(&Method::POST.into(), "/api/v1/users", "createUser").unwrap();
    router
        .insert(&MethodSet::from([Method::GET, Method::DELETE]), r"/api/v1/users/:id{\d+}", "user")
        .unwrap();
    router.insert(&Method::GET.into(), "/api/v1/users/:name", "userByName").unwrap();
    router.insert(&Method::GET.into(), "/api/v1/posts/:year?/:month?", "archive").unwrap();
    router.insert(&MethodSet::Any, "/static/*path", "assets").unwrap();

    assert_eq!(found(&router, &Method::GET, "/api/v1/users").unwrap().0, "listUsers");
    assert_eq!(found(&router, &Method::POST, "/api/v1/users").unwrap().0, "createUser");
    assert_eq!(found(&router, &Method::DELETE, "/api/v1/users/7").unwrap().0, "user");
    assert_eq!(
        found(&router, &Method::GET, "/api/v1/users/alice").unwrap(),
        ("userByName", vec![("name".to_string(), "alice".to_string())])
    );
    assert_eq!(
        found(&router, &Method::GET, "/api/v1/posts/2024").unwrap().1,
        vec![("year".to_string(), "2024".to_string())]
    );
    assert_eq!(found(&router, &Method::GET, "/api/v1/posts/2024/05").unwrap().1.len(), 2);
    assert_eq!(found(&router, &Method::PATCH, "/static/css/site.css").unwrap().0, "assets");

    match router.lookup(&Method::DELETE, "/api/v1/users/alice") {
        Lookup::MethodNotAllowed { allow } => assert_eq!(allow, "GET, HEAD"),
        other => panic!("expected 405, got {other:?}"),
    }
    assert_eq!(router.lookup(&Method::GET, "/nope"), Lookup::NotFound);
}

#[test]
fn trailing_and_repeated_slashes_are_ignored() {
    let mut router = Router::new();
    router.insert(&Method::GET.into(), "/a/b", "ab").unwrap();
    assert!(found(&router, &Method::GET, "/a/b/").is_some());
    assert!(found(&router, &Method::GET, "//a//b").is_some());
}

proptest! {
    #[test]
    fn registered_static_paths_always_match(segments in proptest::collection::vec("[a-z]{1,8}", 1..5)) {
        let path = format!("/{}", segments.join("/"));
        let mut router = Router::new();
        router.insert(&Method::GET.into(), &path, "route").unwrap();
        router.insert(&Method::GET.into(), "/:catch", "param").unwrap();

        let (value, params) = found(&router, &Method::GET, &path).unwrap();
        prop_assert_eq!(value, "route");
        prop_assert!(params.is_empty());
    }
}
