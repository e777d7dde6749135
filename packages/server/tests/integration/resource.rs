use uuid::Uuid;

use crate::common::{TestApp, routes};

mod file_upload {
    use super::*;

    #[tokio::test]
    async fn upload_creates_a_file_resource() {
        let app = TestApp::spawn().await;
        let user = app.user();
        let week = Uuid::new_v4();

        let res = app
            .upload_with_token(week, "notes.pdf", b"PDF_DATA".to_vec(), None, &user.token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"].as_str().unwrap(), "notes.pdf");
        assert_eq!(res.body["kind"].as_str().unwrap(), "file");
        assert_eq!(res.body["week_id"].as_str().unwrap(), week.to_string());
        assert_eq!(res.body["owner_id"].as_str().unwrap(), user.id.to_string());
        assert_eq!(res.body["content_hash"].as_str().unwrap().len(), 64);
        assert!(res.body["url"].is_null());
        assert!(app.object_on_disk(&res.object_id()));
    }

    #[tokio::test]
    async fn explicit_name_overrides_filename() {
        let app = TestApp::spawn().await;
        let user = app.user();

        let res = app
            .upload_with_token(
                Uuid::new_v4(),
                "scan_0001.pdf",
                b"DATA".to_vec(),
                Some("Week 1 handout"),
                &user.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"].as_str().unwrap(), "Week 1 handout");
    }

    #[tokio::test]
    async fn identical_content_in_two_weeks_shares_one_object() {
        let app = TestApp::spawn().await;
        let user = app.user();

        let first = app
            .upload_with_token(Uuid::new_v4(), "a.txt", b"same".to_vec(), None, &user.token)
            .await;
        let second = app
            .upload_with_token(Uuid::new_v4(), "b.txt", b"same".to_vec(), None, &user.token)
            .await;

        assert_eq!(first.status, 201, "{}", first.text);
        assert_eq!(second.status, 201, "{}", second.text);
        assert_ne!(first.id(), second.id());
        assert_eq!(first.object_id(), second.object_id());

        // The redundant copy is removed in the background.
        for _ in 0..100 {
            if app.objects_on_disk() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert_eq!(app.objects_on_disk(), 1);
    }

    #[tokio::test]
    async fn identical_content_in_one_week_conflicts() {
        let app = TestApp::spawn().await;
        let alice = app.user();
        let bob = app.user();
        let week = Uuid::new_v4();

        let first = app
            .upload_with_token(week, "a.txt", b"dup".to_vec(), None, &alice.token)
            .await;
        let second = app
            .upload_with_token(week, "b.txt", b"dup".to_vec(), None, &bob.token)
            .await;

        assert_eq!(first.status, 201, "{}", first.text);
        assert_eq!(second.status, 409);
        assert_eq!(second.body["code"], "CONFLICT");

        let list = app
            .get_with_token(&routes::week_resources(week), &alice.token)
            .await;
        assert_eq!(list.body["total"], 1);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let app = TestApp::spawn().await;
        let user = app.user();

        let res = app
            .upload_with_token(
                Uuid::new_v4(),
                "big.bin",
                vec![7u8; 1024 * 1024 + 1],
                None,
                &user.token,
            )
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn upload_requires_token() {
        let app = TestApp::spawn().await;

        let res = app
            .upload_with_token(Uuid::new_v4(), "a.txt", b"x".to_vec(), None, "not-a-token")
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod link {
    use super::*;

    #[tokio::test]
    async fn duplicate_url_in_week_conflicts_but_other_weeks_accept_it() {
        let app = TestApp::spawn().await;
        let user = app.user();
        let (w1, w2) = (Uuid::new_v4(), Uuid::new_v4());

        let first = app
            .create_link(w1, "Reading", "https://x.example", &user.token)
            .await;
        assert_eq!(first.status, 201, "{}", first.text);
        assert_eq!(first.body["kind"], "link");
        assert_eq!(first.body["url"], "https://x.example");
        assert!(first.body["object_id"].is_null());

        let dup = app
            .create_link(w1, "Reading again", "https://x.example", &user.token)
            .await;
        assert_eq!(dup.status, 409);

        let other = app
            .create_link(w2, "Reading", "https://x.example", &user.token)
            .await;
        assert_eq!(other.status, 201, "{}", other.text);
    }

    #[tokio::test]
    async fn simultaneous_links_to_one_week_create_one_resource() {
        let app = TestApp::spawn().await;
        let (alice, bob) = (app.user(), app.user());
        let week = Uuid::new_v4();

        let (a, b) = tokio::join!(
            app.create_link(week, "Docs", "https://x.example", &alice.token),
            app.create_link(week, "Docs", "https://x.example", &bob.token),
        );

        let mut statuses = [a.status, b.status];
        statuses.sort_unstable();
        assert_eq!(statuses, [201, 409], "{} / {}", a.text, b.text);

        let list = app
            .get_with_token(&routes::week_resources(week), &alice.token)
            .await;
        assert_eq!(list.body["total"], 1);
    }

    #[tokio::test]
    async fn deleted_link_can_be_resubmitted() {
        let app = TestApp::spawn().await;
        let user = app.user();
        let week = Uuid::new_v4();

        let link = app
            .create_link(week, "Docs", "https://x.example", &user.token)
            .await;
        let res = app
            .delete_with_token(&routes::resource(&link.id()), &user.token)
            .await;
        assert_eq!(res.status, 204);

        let list = app
            .get_with_token(&routes::week_resources(week), &user.token)
            .await;
        assert_eq!(list.body["total"], 0);

        let again = app
            .create_link(week, "Docs", "https://x.example", &user.token)
            .await;
        assert_eq!(again.status, 201, "{}", again.text);
    }

    #[tokio::test]
    async fn invalid_url_is_rejected() {
        let app = TestApp::spawn().await;
        let user = app.user();

        let res = app
            .create_link(Uuid::new_v4(), "Bad", "ftp://x.example", &user.token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn only_the_owner_can_delete() {
        let app = TestApp::spawn().await;
        let owner = app.user();
        let stranger = app.user();

        let link = app
            .create_link(Uuid::new_v4(), "Docs", "https://x.example", &owner.token)
            .await;

        let res = app
            .delete_with_token(&routes::resource(&link.id()), &stranger.token)
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");

        let res = app
            .delete_with_token(&routes::resource(&link.id()), &owner.token)
            .await;
        assert_eq!(res.status, 204);
    }

    #[tokio::test]
    async fn deleting_a_file_keeps_its_object() {
        let app = TestApp::spawn().await;
        let user = app.user();

        let file = app
            .upload_with_token(Uuid::new_v4(), "a.txt", b"keep".to_vec(), None, &user.token)
            .await;
        let res = app
            .delete_with_token(&routes::resource(&file.id()), &user.token)
            .await;

        assert_eq!(res.status, 204);
        assert!(app.object_on_disk(&file.object_id()));
        let url = app
            .get_with_token(&routes::object_url(&file.object_id()), &user.token)
            .await;
        assert_eq!(url.status, 200);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn week_listing_is_ordered_by_creation() {
        let app = TestApp::spawn().await;
        let user = app.user();
        let week = Uuid::new_v4();

        let a = app
            .upload_with_token(week, "a.txt", b"a".to_vec(), None, &user.token)
            .await;
        let b = app
            .create_link(week, "B", "https://b.example", &user.token)
            .await;
        app.create_link(Uuid::new_v4(), "C", "https://c.example", &user.token)
            .await;

        let res = app
            .get_with_token(&routes::week_resources(week), &user.token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 2);
        let ids: Vec<&str> = res.body["resources"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![a.id(), b.id()]);
        assert_eq!(res.body["resources"][0]["content_hash"], a.body["content_hash"]);
    }

    #[tokio::test]
    async fn users_list_their_own_resources() {
        let app = TestApp::spawn().await;
        let alice = app.user();
        let bob = app.user();
        let admin = app.admin();

        app.create_link(Uuid::new_v4(), "A", "https://a.example", &alice.token)
            .await;
        app.create_link(Uuid::new_v4(), "B", "https://b.example", &bob.token)
            .await;

        let mine = app
            .get_with_token(&routes::user_resources(alice.id), &alice.token)
            .await;
        assert_eq!(mine.status, 200);
        assert_eq!(mine.body["total"], 1);
        assert_eq!(mine.body["resources"][0]["owner_id"], alice.id.to_string());

        let other = app
            .get_with_token(&routes::user_resources(alice.id), &bob.token)
            .await;
        assert_eq!(other.status, 403);

        let as_admin = app
            .get_with_token(&routes::user_resources(alice.id), &admin.token)
            .await;
        assert_eq!(as_admin.body["total"], 1);
    }

    #[tokio::test]
    async fn listing_requires_token() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&routes::week_resources(Uuid::new_v4()))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod object_url {
    use super::*;

    #[tokio::test]
    async fn presigned_url_points_at_the_object() {
        let app = TestApp::spawn().await;
        let user = app.user();
        let file = app
            .upload_with_token(Uuid::new_v4(), "a.txt", b"bytes".to_vec(), None, &user.token)
            .await;

        let res = app
            .get_with_token(&routes::object_url(&file.object_id()), &user.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["url"].as_str().unwrap().contains(&file.object_id()));
        assert_eq!(res.body["expires_in"], 60);
    }

    #[tokio::test]
    async fn unknown_object_is_not_found() {
        let app = TestApp::spawn().await;
        let user = app.user();

        let res = app
            .get_with_token(&routes::object_url(&Uuid::new_v4().to_string()), &user.token)
            .await;

        assert_eq!(res.status, 404);
    }
}
