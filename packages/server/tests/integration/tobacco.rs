use uuid::Uuid;

use crate::common::{PNG_BYTES, TestApp, TobaccoFormData, routes};

/// Create a tobacco over HTTP and return its id.
async fn create_via_http(app: &TestApp, token: &str, fabricator: Uuid, name: &str) -> Uuid {
    let res = app
        .post_form(
            routes::TOBACCOS,
            TobaccoFormData {
                name: Some(name),
                fabricator_id: Some(fabricator.to_string()),
                description: Some("smooth"),
                image: Some(("photo.png", PNG_BYTES)),
            },
            Some(token),
        )
        .await;
    assert_eq!(res.status, 201, "Create failed: {}", res.text);
    res.body["body"]["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("Missing id in create response")
}

mod create {
    use super::*;

    #[tokio::test]
    async fn created_photo_is_served_back() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_authenticated_user("owner").await;
        let fabricator = app.seed_fabricator("Starbuzz").await;

        let id = create_via_http(&app, &token, fabricator, "Blue Mist").await;

        let res = app.get_without_token(&routes::tobacco(id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["success"], true);
        let detail = &res.body["body"];
        assert_eq!(detail["name"], "Blue Mist");
        assert_eq!(detail["fabricator"], "Starbuzz");
        assert_eq!(detail["description"], "smooth");
        let photo = detail["photoUrl"].as_str().unwrap();
        assert!(photo.starts_with("uploads/tobaccos/"), "{photo}");
        assert!(photo.ends_with(".png"), "{photo}");

        let (status, content_type, bytes) = app.get_bytes(&routes::asset(photo)).await;
        assert_eq!(status, 200);
        assert_eq!(content_type.as_deref(), Some("image/png"));
        assert_eq!(bytes, PNG_BYTES);
    }

    #[tokio::test]
    async fn requires_a_token() {
        let app = TestApp::spawn().await;
        let fabricator = app.seed_fabricator("Starbuzz").await;

        let res = app
            .post_form(
                routes::TOBACCOS,
                TobaccoFormData {
                    name: Some("Blue Mist"),
                    fabricator_id: Some(fabricator.to_string()),
                    image: Some(("photo.png", PNG_BYTES)),
                    ..Default::default()
                },
                None,
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
        assert_eq!(app.stored_photo_count(), 0);
    }

    #[tokio::test]
    async fn forged_token_is_rejected() {
        let app = TestApp::spawn().await;
        let fabricator = app.seed_fabricator("Starbuzz").await;
        let forged = tobacco_server::utils::jwt::sign("other-secret", Uuid::new_v4(), "mallory")
            .unwrap();

        let res = app
            .post_form(
                routes::TOBACCOS,
                TobaccoFormData {
                    name: Some("Blue Mist"),
                    fabricator_id: Some(fabricator.to_string()),
                    image: Some(("photo.png", PNG_BYTES)),
                    ..Default::default()
                },
                Some(&forged),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_authenticated_user("owner").await;
        let fabricator = app.seed_fabricator("Starbuzz").await;

        let res = app
            .post_form(
                routes::TOBACCOS,
                TobaccoFormData {
                    name: Some("Blue Mist"),
                    fabricator_id: Some(fabricator.to_string()),
                    image: Some(("notes.txt", &b"hello"[..])),
                    ..Default::default()
                },
                Some(&token),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.stored_photo_count(), 0);
    }

    #[tokio::test]
    async fn missing_image_is_rejected() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_authenticated_user("owner").await;
        let fabricator = app.seed_fabricator("Starbuzz").await;

        let res = app
            .post_form(
                routes::TOBACCOS,
                TobaccoFormData {
                    name: Some("Blue Mist"),
                    fabricator_id: Some(fabricator.to_string()),
                    ..Default::default()
                },
                Some(&token),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn invalid_fields_leave_no_stored_photo() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_authenticated_user("owner").await;

        for fabricator_id in ["not-a-uuid".to_string(), Uuid::new_v4().to_string()] {
            let res = app
                .post_form(
                    routes::TOBACCOS,
                    TobaccoFormData {
                        name: Some("Blue Mist"),
                        fabricator_id: Some(fabricator_id),
                        image: Some(("photo.jpg", PNG_BYTES)),
                        ..Default::default()
                    },
                    Some(&token),
                )
                .await;
            assert_eq!(res.status, 400, "{}", res.text);
        }

        assert_eq!(app.stored_photo_count(), 0);
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::tobacco(Uuid::new_v4())).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert_eq!(res.body["message"], "Tobacco not found");
    }

    #[tokio::test]
    async fn token_personalizes_the_detail() {
        let app = TestApp::spawn().await;
        let (owner, token) = app.create_authenticated_user("owner").await;
        let fabricator = app.seed_fabricator("Starbuzz").await;
        let id = create_via_http(&app, &token, fabricator, "Blue Mist").await;
        app.rate(id, owner, 4).await;
        app.mark_favorite(id, owner).await;

        let mine = app.get_with_token(&routes::tobacco(id), &token).await;
        assert_eq!(mine.status, 200);
        assert_eq!(mine.body["body"]["myRating"], 4);
        assert_eq!(mine.body["body"]["isRated"], true);
        assert_eq!(mine.body["body"]["isFavorite"], true);
        assert_eq!(mine.body["body"]["ratingsQuantity"], 1);
        assert_eq!(mine.body["body"]["markQuantity"], 1);

        let anonymous = app.get_without_token(&routes::tobacco(id)).await;
        assert_eq!(anonymous.body["body"]["myRating"], 0);
        assert_eq!(anonymous.body["body"]["isFavorite"], false);
    }

    #[tokio::test]
    async fn bad_token_reads_as_anonymous() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_authenticated_user("owner").await;
        let fabricator = app.seed_fabricator("Starbuzz").await;
        let id = create_via_http(&app, &token, fabricator, "Blue Mist").await;

        let res = app.get_with_token(&routes::tobacco(id), "garbage").await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["body"]["isRated"], false);
    }

    #[tokio::test]
    async fn list_is_sorted_by_name() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_authenticated_user("owner").await;
        let fabricator = app.seed_fabricator("Starbuzz").await;
        for name in ["Pineapple", "Blue Mist", "Code 69"] {
            create_via_http(&app, &token, fabricator, name).await;
        }

        let res = app.get_without_token(routes::TOBACCOS).await;

        assert_eq!(res.status, 200);
        let names: Vec<&str> = res.body["body"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Blue Mist", "Code 69", "Pineapple"]);
        assert_eq!(res.body["body"][0]["rating"], 0.0);
        assert_eq!(res.body["body"][0]["fabricator"], "Starbuzz");
    }

    #[tokio::test]
    async fn comments_are_listed_with_authors() {
        let app = TestApp::spawn().await;
        let (owner, token) = app.create_authenticated_user("owner").await;
        let fabricator = app.seed_fabricator("Starbuzz").await;
        let id = create_via_http(&app, &token, fabricator, "Blue Mist").await;
        app.seed_comment("tobacco", id, owner, "lovely", 3, false)
            .await;

        let res = app.get_without_token(&routes::tobacco_comments(id)).await;

        assert_eq!(res.status, 200);
        let comments = res.body["body"].as_array().unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0]["text"], "lovely");
        assert_eq!(comments[0]["login"], "owner");
        assert_eq!(comments[0]["tobaccoId"], id.to_string());
    }

    #[tokio::test]
    async fn asset_paths_cannot_escape_the_upload_root() {
        let app = TestApp::spawn().await;

        let (status, _, _) = app.get_bytes("/uploads/tobaccos/..%2F..%2Fcatalog.db").await;
        assert_eq!(status, 404);

        let (status, _, _) = app.get_bytes("/uploads/tobaccos/missing.png").await;
        assert_eq!(status, 404);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_authenticated_user("owner").await;
        let fabricator = app.seed_fabricator("Starbuzz").await;
        let id = create_via_http(&app, &token, fabricator, "Blue Mist").await;
        let before = app.get_without_token(&routes::tobacco(id)).await;

        let res = app
            .patch_form(
                &routes::tobacco(id),
                TobaccoFormData {
                    description: Some("new"),
                    ..Default::default()
                },
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let detail = &res.body["body"];
        assert_eq!(detail["name"], "Blue Mist");
        assert_eq!(detail["fabricatorId"], fabricator.to_string());
        assert_eq!(detail["description"], "new");
        assert_eq!(detail["photoUrl"], before.body["body"]["photoUrl"]);
        assert_eq!(app.stored_photo_count(), 1);
    }

    #[tokio::test]
    async fn new_image_replaces_the_old_file() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_authenticated_user("owner").await;
        let fabricator = app.seed_fabricator("Starbuzz").await;
        let id = create_via_http(&app, &token, fabricator, "Blue Mist").await;
        let before = app.get_without_token(&routes::tobacco(id)).await;
        let old_photo = before.body["body"]["photoUrl"].as_str().unwrap().to_string();

        let res = app
            .patch_form(
                &routes::tobacco(id),
                TobaccoFormData {
                    image: Some(("fresh.webp", &b"webp bytes"[..])),
                    ..Default::default()
                },
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let new_photo = res.body["body"]["photoUrl"].as_str().unwrap().to_string();
        assert_ne!(new_photo, old_photo);
        assert!(new_photo.ends_with(".webp"));
        assert!(app.photo_exists(&new_photo).await);

        // The old file is deleted in the background.
        let mut old_gone = false;
        for _ in 0..50 {
            if !app.photo_exists(&old_photo).await {
                old_gone = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(old_gone, "previous photo was not deleted");
    }

    #[tokio::test]
    async fn unknown_id_discards_the_upload() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_authenticated_user("owner").await;

        let res = app
            .patch_form(
                &routes::tobacco(Uuid::new_v4()),
                TobaccoFormData {
                    name: Some("Ghost"),
                    image: Some(("ghost.png", PNG_BYTES)),
                    ..Default::default()
                },
                &token,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(app.stored_photo_count(), 0);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn delete_reports_archive_and_hides_the_tobacco() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_authenticated_user("owner").await;
        let fabricator = app.seed_fabricator("Starbuzz").await;
        let id = create_via_http(&app, &token, fabricator, "Blue Mist").await;

        let res = app.delete_with_token(&routes::tobacco(id), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["body"]["id"], id.to_string());
        assert!(res.body["body"]["archiveId"].is_string());

        let gone = app.get_without_token(&routes::tobacco(id)).await;
        assert_eq!(gone.status, 404);

        let again = app.delete_with_token(&routes::tobacco(id), &token).await;
        assert_eq!(again.status, 404);
    }

    #[tokio::test]
    async fn delete_requires_a_token() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_authenticated_user("owner").await;
        let fabricator = app.seed_fabricator("Starbuzz").await;
        let id = create_via_http(&app, &token, fabricator, "Blue Mist").await;

        let res = app.delete_with_token(&routes::tobacco(id), "").await;
        assert_eq!(res.status, 401);

        let still_there = app.get_without_token(&routes::tobacco(id)).await;
        assert_eq!(still_there.status, 200);
    }

    #[tokio::test]
    async fn failed_cascade_is_a_generic_error() {
        use sea_orm::ConnectionTrait;

        let app = TestApp::spawn().await;
        let (_, token) = app.create_authenticated_user("owner").await;
        let fabricator = app.seed_fabricator("Starbuzz").await;
        let id = create_via_http(&app, &token, fabricator, "Blue Mist").await;
        app.db
            .execute_unprepared("DROP TABLE tobacco_rating")
            .await
            .unwrap();

        let res = app.delete_with_token(&routes::tobacco(id), &token).await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "INTERNAL_ERROR");
        assert_eq!(res.body["message"], "Tobacco was not deleted");

        let gone = app.get_without_token(&routes::tobacco(id)).await;
        assert_eq!(gone.status, 404);
    }
}
