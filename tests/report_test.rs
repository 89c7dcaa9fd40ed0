mod common;

use chrono::NaiveDateTime;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use serde_json::Value;
use tripdesk::models::{report, Direction, Report, ReportStatus};

/// A report written straight to the store, bypassing the API clock.
fn stored_report(
    author_id: i64,
    created_at: NaiveDateTime,
    comment: String,
) -> report::ActiveModel {
    report::ActiveModel {
        author_id: Set(author_id as i32),
        direction: Set(Direction::Loading),
        origin_city: Set("Moscow".to_string()),
        destination_city: Set("Kazan".to_string()),
        cargo_description: Set(String::new()),
        vehicle: Set(String::new()),
        trailer: Set(String::new()),
        distance_km: Set(0.0),
        window_start: Set(None),
        window_end: Set(None),
        rating: Set(0.0),
        comment: Set(comment),
        status: Set(ReportStatus::Pending),
        created_at: Set(created_at),
        updated_at: Set(created_at),
        ..Default::default()
    }
}

/// Inserts `count` reports one second apart, oldest first. The three oldest mention `marker`.
async fn seed_reports(app: &common::TestApp, author_id: i64, count: usize) {
    let base = chrono::Utc::now().naive_utc() - chrono::Duration::hours(2);
    let models: Vec<_> = (0..count)
        .map(|i| {
            let comment = if i < 3 {
                format!("bulk load {i} marker")
            } else {
                format!("bulk load {i}")
            };
            stored_report(author_id, base + chrono::Duration::seconds(i as i64), comment)
        })
        .collect();

    for chunk in models.chunks(100) {
        Report::insert_many(chunk.to_vec())
            .exec(&app.db)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn create_report_records_author_and_starts_pending() {
    let app = common::spawn_app().await;
    let (driver_id, token) = common::register(&app, "anton", "DRIVER").await;

    let report = common::create_report(
        &app,
        &token,
        serde_json::json!({
            "direction": "UNLOADING",
            "origin_city": "  Moscow ",
            "destination_city": "Kazan",
            "cargo_description": "Steel coils",
            "vehicle": "Volvo FH 2022",
            "distance_km": 820.5,
            "window_start": "2024-05-01",
            "window_end": "2024-05-03",
            "rating": 4.3,
            "comment": "Smooth road"
        }),
    )
    .await;

    assert_eq!(report["author_id"], driver_id);
    assert_eq!(report["author_name"], "anton");
    assert_eq!(report["status"], "PENDING");
    assert_eq!(report["direction"], "UNLOADING");
    assert_eq!(report["origin_city"], "Moscow");
    assert_eq!(report["trailer"], "Krone Cool Liner");
    assert_eq!(report["distance_km"], 820.5);
    assert_eq!(report["window_start"], "2024-05-01");
    assert_eq!(report["rating"], 4.3);
    assert_eq!(report["created_at"], report["updated_at"]);
}

#[tokio::test]
async fn legacy_field_names_and_defaults() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_driver(&app, "legacy").await;

    let report = common::create_report(
        &app,
        &token,
        serde_json::json!({
            "type": "РАЗГРУЗКА",
            "from_city": "Самара",
            "to_city": "Уфа",
            "truck": "Unknown Truck",
            "km": 460,
            "score": 3.7,
            "note": "ok"
        }),
    )
    .await;
    assert_eq!(report["direction"], "UNLOADING");
    assert_eq!(report["vehicle"], "Unknown Truck");
    assert_eq!(report["trailer"], "");
    assert_eq!(report["comment"], "ok");

    let report = common::create_route(&app, &token, "Tver", "Pskov").await;
    assert_eq!(report["direction"], "LOADING");
    assert_eq!(report["distance_km"], 0.0);
    assert_eq!(report["rating"], 0.0);
}

#[tokio::test]
async fn explicit_trailer_wins_over_catalog() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_driver(&app, "trailer").await;

    let report = common::create_report(
        &app,
        &token,
        serde_json::json!({
            "origin_city": "Moscow",
            "destination_city": "Tula",
            "vehicle": "Scania R500",
            "trailer": "Own flatbed"
        }),
    )
    .await;
    assert_eq!(report["trailer"], "Own flatbed");
}

#[tokio::test]
async fn rating_is_stored_as_supplied_or_derived_from_sub_scores() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_driver(&app, "rater").await;

    // The client value is trusted even when it is outside the 1..=5 scale.
    let report = common::create_report(
        &app,
        &token,
        serde_json::json!({ "origin_city": "A-town", "destination_city": "B-town", "rating": 9.5 }),
    )
    .await;
    assert_eq!(report["rating"], 9.5);

    let report = common::create_report(
        &app,
        &token,
        serde_json::json!({
            "origin_city": "A-town",
            "destination_city": "B-town",
            "sub_scores": { "road": 4, "client": 5, "route": 4 }
        }),
    )
    .await;
    assert_eq!(report["rating"], 4.3);
}

#[tokio::test]
async fn create_report_validation_errors() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_driver(&app, "sloppy").await;

    let cases = [
        (serde_json::json!({ "origin_city": "Moscow" }), "ROUTE_REQUIRED"),
        (
            serde_json::json!({ "origin_city": "   ", "destination_city": "Kazan" }),
            "ROUTE_REQUIRED",
        ),
        (
            serde_json::json!({ "origin_city": "Moscow", "destination_city": "Kazan", "distance_km": -5 }),
            "BAD_DISTANCE",
        ),
        (
            serde_json::json!({ "origin_city": "Moscow", "destination_city": "Kazan", "direction": "SIDEWAYS" }),
            "BAD_DIRECTION",
        ),
    ];

    for (body, code) in cases {
        let resp = app
            .client
            .post(app.url("/reports"))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], code);
    }

    assert!(common::list_reports(&app, &token, "").await.is_empty());
}

#[tokio::test]
async fn create_report_requires_auth() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/reports"))
        .json(&serde_json::json!({ "origin_city": "Moscow", "destination_city": "Kazan" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "NO_TOKEN");
}

#[tokio::test]
async fn reviewers_may_author_reports() {
    let app = common::spawn_app().await;
    let (reviewer_id, token) = common::create_reviewer(&app, "writer").await;

    let report = common::create_route(&app, &token, "Omsk", "Tomsk").await;
    assert_eq!(report["author_id"], reviewer_id);
}

#[tokio::test]
async fn listing_is_newest_first() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_driver(&app, "order").await;

    let first = common::create_route(&app, &token, "A1", "B1").await;
    let second = common::create_route(&app, &token, "A2", "B2").await;
    let third = common::create_route(&app, &token, "A3", "B3").await;

    let reports = common::list_reports(&app, &token, "").await;
    assert_eq!(
        common::ids(&reports),
        vec![
            third["id"].as_i64().unwrap(),
            second["id"].as_i64().unwrap(),
            first["id"].as_i64().unwrap(),
        ]
    );
}

#[tokio::test]
async fn equal_timestamps_fall_back_to_newest_id() {
    let app = common::spawn_app().await;
    let (driver_id, token) = common::create_driver(&app, "tie").await;

    let at = chrono::Utc::now().naive_utc();
    let first = stored_report(driver_id, at, "first".to_string())
        .insert(&app.db)
        .await
        .unwrap();
    let second = stored_report(driver_id, at, "second".to_string())
        .insert(&app.db)
        .await
        .unwrap();
    assert!(second.id > first.id);

    let reports = common::list_reports(&app, &token, "").await;
    assert_eq!(common::ids(&reports), vec![second.id as i64, first.id as i64]);
}

#[tokio::test]
async fn listing_is_capped_at_500_newest() {
    let app = common::spawn_app().await;
    let (driver_id, _) = common::create_driver(&app, "bulk").await;
    let (_, reviewer) = common::create_reviewer(&app, "bulk_rev").await;
    seed_reports(&app, driver_id, 520).await;

    for query in ["", "?q=bulk", "?q=BULK%20LOAD"] {
        let reports = common::list_reports(&app, &reviewer, query).await;
        assert_eq!(reports.len(), 500, "{query}");
        assert_eq!(reports[0]["comment"], "bulk load 519", "{query}");
        assert_eq!(reports[499]["comment"], "bulk load 20", "{query}");

        let ids = common::ids(&reports);
        assert!(ids.windows(2).all(|w| w[0] > w[1]), "{query}");
    }
}

#[tokio::test]
async fn search_reaches_rows_beyond_the_cap() {
    let app = common::spawn_app().await;
    let (driver_id, token) = common::create_driver(&app, "deep").await;
    seed_reports(&app, driver_id, 520).await;

    // The only matches are the three oldest rows, well past the first 500.
    let reports = common::list_reports(&app, &token, "?q=marker").await;
    let comments: Vec<&str> = reports
        .iter()
        .filter_map(|r| r["comment"].as_str())
        .collect();
    assert_eq!(
        comments,
        vec!["bulk load 2 marker", "bulk load 1 marker", "bulk load 0 marker"]
    );
}

#[tokio::test]
async fn empty_listing_is_not_an_error() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_reviewer(&app, "idle").await;

    assert!(common::list_reports(&app, &token, "").await.is_empty());
    assert!(common::list_reports(&app, &token, "?q=nothing").await.is_empty());
}

#[tokio::test]
async fn filters_by_direction_and_status() {
    let app = common::spawn_app().await;
    let (_, driver) = common::create_driver(&app, "filter").await;
    let (_, reviewer) = common::create_reviewer(&app, "filter_rev").await;

    let loading = common::create_report(
        &app,
        &driver,
        serde_json::json!({ "origin_city": "A", "destination_city": "B", "direction": "LOADING" }),
    )
    .await;
    let unloading = common::create_report(
        &app,
        &driver,
        serde_json::json!({ "origin_city": "C", "destination_city": "D", "direction": "UNLOADING" }),
    )
    .await;
    let unloading_id = unloading["id"].as_i64().unwrap();
    let loading_id = loading["id"].as_i64().unwrap();

    let (status, _) =
        common::set_status(&app, &reviewer, &unloading_id.to_string(), "APPROVED").await;
    assert_eq!(status, 200);

    let only_unloading = common::list_reports(&app, &reviewer, "?type=UNLOADING").await;
    assert_eq!(common::ids(&only_unloading), vec![unloading_id]);

    let via_alias = common::list_reports(&app, &reviewer, "?direction=loading").await;
    assert_eq!(common::ids(&via_alias), vec![loading_id]);

    let approved = common::list_reports(&app, &reviewer, "?status=APPROVED").await;
    assert_eq!(common::ids(&approved), vec![unloading_id]);

    let pending_unloading =
        common::list_reports(&app, &reviewer, "?status=PENDING&type=UNLOADING").await;
    assert!(pending_unloading.is_empty());

    let everything = common::list_reports(&app, &reviewer, "?status=ALL&type=ALL").await;
    assert_eq!(everything.len(), 2);

    let garbage = common::list_reports(&app, &reviewer, "?status=maybe&type=up").await;
    assert_eq!(garbage.len(), 2);
}

#[tokio::test]
async fn text_search_is_case_insensitive() {
    let app = common::spawn_app().await;
    let (_, driver) = common::register(&app, "Petrov", "DRIVER").await;
    let (_, reviewer) = common::create_reviewer(&app, "search_rev").await;

    let moscow = common::create_report(
        &app,
        &driver,
        serde_json::json!({
            "origin_city": "Москва",
            "destination_city": "Казань",
            "cargo_description": "Трубы"
        }),
    )
    .await;
    common::create_report(
        &app,
        &driver,
        serde_json::json!({
            "origin_city": "Tver",
            "destination_city": "Pskov",
            "comment": "Loaded at dawn"
        }),
    )
    .await;
    let moscow_id = moscow["id"].as_i64().unwrap();

    let upper = common::list_reports(&app, &reviewer, "?q=Москва").await;
    let lower = common::list_reports(&app, &reviewer, "?q=москва").await;
    let screaming = common::list_reports(&app, &reviewer, "?q=МОСКВА").await;
    assert_eq!(common::ids(&upper), vec![moscow_id]);
    assert_eq!(common::ids(&upper), common::ids(&lower));
    assert_eq!(common::ids(&upper), common::ids(&screaming));

    let by_cargo = common::list_reports(&app, &reviewer, "?q=трубы").await;
    assert_eq!(common::ids(&by_cargo), vec![moscow_id]);

    let by_comment = common::list_reports(&app, &reviewer, "?q=DAWN").await;
    assert_eq!(by_comment.len(), 1);

    let by_author = common::list_reports(&app, &reviewer, "?q=petrov").await;
    assert_eq!(by_author.len(), 2);
}

#[tokio::test]
async fn driver_never_sees_other_drivers_reports() {
    let app = common::spawn_app().await;
    let (alice_id, alice) = common::create_driver(&app, "alice").await;
    let (_, bob) = common::register(&app, "bob_the_driver", "DRIVER").await;

    common::create_route(&app, &alice, "Moscow", "Kazan").await;
    common::create_route(&app, &bob, "Moscow", "Kazan").await;
    common::create_route(&app, &bob, "Perm", "Kirov").await;

    for query in [
        "",
        "?status=ALL",
        "?status=PENDING",
        "?type=LOADING",
        "?q=moscow",
        "?q=bob_the_driver",
        "?q=Kirov&type=ALL&status=ALL",
    ] {
        let reports = common::list_reports(&app, &alice, query).await;
        assert!(
            reports.iter().all(|r| r["author_id"] == alice_id),
            "query {query} leaked: {reports:?}"
        );
    }

    assert_eq!(common::list_reports(&app, &alice, "").await.len(), 1);
    assert_eq!(common::list_reports(&app, &bob, "").await.len(), 2);
}
