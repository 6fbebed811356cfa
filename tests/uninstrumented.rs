//! Runs in its own process, where tracking is never installed.

use bytes::Bytes;
use express_mountpath::mountpath::{self, MountPathExt};
use express_mountpath::{Handler, Router, app};

#[tokio::test]
async fn requests_carry_no_mount_path_without_install() {
    let mut users = Router::new();
    users
        .get(
            "/:id",
            Handler::endpoint_sync(|req, res| {
                let seen = req.mount_path().is_none() && !req.is_mount_path_frozen();
                res.send(seen.to_string());
            }),
        )
        .unwrap();

    let mut app = app();
    app.mount("/users", users).unwrap();

    let mut req = hyper::Request::builder()
        .uri("/users/3")
        .body(Bytes::new())
        .unwrap();
    let res = app.handle(&mut req).await;

    assert!(!mountpath::is_installed());
    assert_eq!(res.body(), b"true");
    assert_eq!(req.mount_path(), None);
    assert_eq!(req.current_mount_path(), None);
}
