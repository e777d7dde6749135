use uuid::Uuid;

use crate::common::{TestApp, routes};

mod orphan_collection {
    use super::*;

    #[tokio::test]
    async fn shared_object_survives_until_its_last_resource_is_gone() {
        let app = TestApp::spawn().await;
        let user = app.user();
        let admin = app.admin();

        let first = app
            .upload_with_token(Uuid::new_v4(), "a.txt", b"h1".to_vec(), None, &user.token)
            .await;
        let second = app
            .upload_with_token(Uuid::new_v4(), "b.txt", b"h1".to_vec(), None, &user.token)
            .await;
        let object_id = first.object_id();
        app.age_objects().await;

        app.delete_with_token(&routes::resource(&first.id()), &user.token)
            .await;
        let report = app.collect_orphans(&admin.token).await;
        assert_eq!(report.status, 200, "{}", report.text);
        assert_eq!(report.body["reclaimed"].as_array().unwrap().len(), 0);
        assert!(app.object_on_disk(&object_id));

        app.delete_with_token(&routes::resource(&second.id()), &user.token)
            .await;
        let report = app.collect_orphans(&admin.token).await;
        assert_eq!(report.body["reclaimed"][0], object_id.as_str());
        assert!(!app.object_on_disk(&object_id));

        let url = app
            .get_with_token(&routes::object_url(&object_id), &user.token)
            .await;
        assert_eq!(url.status, 404);
    }

    #[tokio::test]
    async fn deleted_upload_is_reclaimed_from_disk() {
        let app = TestApp::spawn().await;
        let user = app.user();
        let admin = app.admin();

        let file = app
            .upload_with_token(Uuid::new_v4(), "a.txt", b"gone".to_vec(), None, &user.token)
            .await;
        app.delete_with_token(&routes::resource(&file.id()), &user.token)
            .await;

        let report = app.collect_orphans(&admin.token).await;

        assert_eq!(report.status, 200, "{}", report.text);
        assert_eq!(report.body["reclaimed"][0], file.object_id().as_str());
        assert!(report.body["failed"].as_array().unwrap().is_empty());
        assert_eq!(app.objects_on_disk(), 0);
    }

    #[tokio::test]
    async fn collection_requires_admin() {
        let app = TestApp::spawn().await;
        let user = app.user();

        let res = app.collect_orphans(&user.token).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}
