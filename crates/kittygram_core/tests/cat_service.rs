use kittygram_core::db::open_db_in_memory;
use kittygram_core::{
    CatColor, CatPayload, CatSummaryPayload, KittygramService, OwnerPayload, ServiceError,
    ValidationErrors,
};
use rusqlite::Connection;
use serde_json::json;

fn year_2026() -> i32 {
    2026
}

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn cat_payload(value: serde_json::Value) -> CatPayload {
    serde_json::from_value(value).unwrap()
}

fn owner_payload(value: serde_json::Value) -> OwnerPayload {
    serde_json::from_value(value).unwrap()
}

fn seed_smith(service: &mut KittygramService<'_>) {
    service
        .create_owner(owner_payload(json!({"first_name": "Ann", "last_name": "Smith"})))
        .unwrap();
}

fn validation_errors(err: ServiceError) -> ValidationErrors {
    match err {
        ServiceError::Validation(errors) => errors,
        other => panic!("expected validation error, got {other}"),
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn create_cat_renders_owner_achievements_and_age() {
    let mut conn = setup();
    let mut service = KittygramService::with_year_source(&mut conn, year_2026);
    seed_smith(&mut service);

    let cat = service
        .create_cat(cat_payload(json!({
            "name": "Tom",
            "color": "black",
            "birth_year": 2020,
            "owner": "Smith",
            "achievements": [{"achievement_name": "Best Mouser"}]
        })))
        .unwrap();

    assert_eq!(cat.name, "Tom");
    assert_eq!(cat.color, CatColor::Black);
    assert_eq!(cat.owner, "Smith");
    assert_eq!(cat.age, 6);
    assert_eq!(cat.achievements.len(), 1);
    assert_eq!(cat.achievements[0].achievement_name, "Best Mouser");

    let wire = serde_json::to_value(&cat).unwrap();
    assert_eq!(wire["color"], "black");
    assert_eq!(wire["achievements"][0]["achievement_name"], "Best Mouser");
    assert!(wire["achievements"][0].get("name").is_none());
}

#[test]
fn age_follows_wall_clock_by_default() {
    let mut conn = setup();
    let mut service = KittygramService::new(&mut conn);
    seed_smith(&mut service);

    let cat = service
        .create_cat(cat_payload(json!({
            "name": "Tom",
            "color": "black",
            "birth_year": 2020,
            "owner": "Smith",
            "achievements": []
        })))
        .unwrap();

    assert_eq!(cat.age, i64::from(kittygram_core::current_year()) - 2020);
}

#[test]
fn age_is_exact_for_extreme_and_future_birth_years() {
    let mut conn = setup();
    let mut service = KittygramService::with_year_source(&mut conn, year_2026);
    seed_smith(&mut service);

    let ancient = service
        .create_cat(cat_payload(json!({
            "name": "Tom",
            "color": "black",
            "birth_year": i32::MIN,
            "owner": "Smith",
            "achievements": []
        })))
        .unwrap();
    assert_eq!(ancient.age, 2026 - i64::from(i32::MIN));
    assert_eq!(
        service.get_cat(ancient.id).unwrap().unwrap().age,
        2_147_485_674
    );

    let unborn = service
        .update_cat(ancient.id, cat_payload(json!({"birth_year": 2030})))
        .unwrap();
    assert_eq!(unborn.age, -4);

    let owners = service.list_owners().unwrap();
    assert_eq!(owners[0].cats[0].age, -4);
}

#[test]
fn explicit_null_is_not_treated_as_missing() {
    let mut conn = setup();
    let mut service = KittygramService::with_year_source(&mut conn, year_2026);
    seed_smith(&mut service);

    let err = service
        .create_cat(cat_payload(json!({
            "name": "Tom",
            "color": null,
            "birth_year": 2020,
            "owner": "Smith",
            "achievements": []
        })))
        .unwrap_err();
    let errors = validation_errors(err);
    assert_eq!(
        errors.field("color").unwrap(),
        ["This field may not be null.".to_string()]
    );
}

#[test]
fn update_rejects_null_name_and_keeps_the_cat() {
    let mut conn = setup();
    let mut service = KittygramService::with_year_source(&mut conn, year_2026);
    seed_smith(&mut service);
    let cat = service
        .create_cat(cat_payload(json!({
            "name": "Tom",
            "color": "black",
            "birth_year": 2020,
            "owner": "Smith",
            "achievements": [{"achievement_name": "Napper"}]
        })))
        .unwrap();

    let err = service
        .update_cat(
            cat.id,
            cat_payload(json!({"name": null, "achievements": null, "color": "white"})),
        )
        .unwrap_err();
    let errors = validation_errors(err);
    let fields: Vec<&str> = errors.field_names().collect();
    assert_eq!(fields, vec!["achievements", "name"]);

    assert_eq!(service.get_cat(cat.id).unwrap().unwrap(), cat);
}

#[test]
fn create_cat_links_duplicate_descriptors_to_one_achievement() {
    let mut conn = setup();
    {
        let mut service = KittygramService::with_year_source(&mut conn, year_2026);
        seed_smith(&mut service);

        let cat = service
            .create_cat(cat_payload(json!({
                "name": "Tom",
                "color": "ginger",
                "birth_year": 2021,
                "owner": "Smith",
                "achievements": [
                    {"achievement_name": "Napper"},
                    {"achievement_name": "Napper"}
                ]
            })))
            .unwrap();

        assert_eq!(cat.achievements.len(), 2);
        assert_eq!(cat.achievements[0].id, cat.achievements[1].id);
    }
    assert_eq!(count(&conn, "achievements"), 1);
    assert_eq!(count(&conn, "achievement_cats"), 2);
}

#[test]
fn create_cat_reports_every_missing_field_and_writes_nothing() {
    let mut conn = setup();
    {
        let mut service = KittygramService::with_year_source(&mut conn, year_2026);
        let err = service
            .create_cat(cat_payload(json!({"name": "  ", "color": "purple"})))
            .unwrap_err();

        let errors = validation_errors(err);
        let fields: Vec<&str> = errors.field_names().collect();
        assert_eq!(
            fields,
            vec!["achievements", "birth_year", "color", "name", "owner"]
        );
        assert_eq!(
            errors.field("color").unwrap(),
            ["\"purple\" is not a valid choice.".to_string()]
        );
    }
    assert_eq!(count(&conn, "cats"), 0);
}

#[test]
fn create_cat_with_unknown_owner_is_a_validation_error() {
    let mut conn = setup();
    let mut service = KittygramService::with_year_source(&mut conn, year_2026);

    let err = service
        .create_cat(cat_payload(json!({
            "name": "Tom",
            "color": "black",
            "birth_year": 2020,
            "owner": "Nobody",
            "achievements": []
        })))
        .unwrap_err();

    let errors = validation_errors(err);
    assert_eq!(
        errors.field("owner").unwrap(),
        ["Object with last_name=Nobody does not exist.".to_string()]
    );
}

#[test]
fn create_cat_with_ambiguous_owner_is_a_lookup_error() {
    let mut conn = setup();
    let mut service = KittygramService::with_year_source(&mut conn, year_2026);
    seed_smith(&mut service);
    seed_smith(&mut service);

    let err = service
        .create_cat(cat_payload(json!({
            "name": "Tom",
            "color": "black",
            "birth_year": 2020,
            "owner": "Smith",
            "achievements": []
        })))
        .unwrap_err();

    assert!(matches!(err, ServiceError::Lookup { entity: "owner", .. }));
    assert_eq!(err.code(), "ambiguous_lookup");
}

#[test]
fn update_with_empty_achievements_keeps_existing_links() {
    let mut conn = setup();
    let mut service = KittygramService::with_year_source(&mut conn, year_2026);
    seed_smith(&mut service);
    let cat = service
        .create_cat(cat_payload(json!({
            "name": "Tom",
            "color": "black",
            "birth_year": 2020,
            "owner": "Smith",
            "achievements": [{"achievement_name": "Best Mouser"}]
        })))
        .unwrap();

    let updated = service
        .update_cat(cat.id, cat_payload(json!({"name": "Tommy", "achievements": []})))
        .unwrap();

    assert_eq!(updated.name, "Tommy");
    assert_eq!(updated.color, CatColor::Black);
    assert_eq!(updated.achievements, cat.achievements);
}

#[test]
fn update_with_achievements_replaces_the_whole_set() {
    let mut conn = setup();
    let mut service = KittygramService::with_year_source(&mut conn, year_2026);
    seed_smith(&mut service);
    let cat = service
        .create_cat(cat_payload(json!({
            "name": "Tom",
            "color": "black",
            "birth_year": 2020,
            "owner": "Smith",
            "achievements": [
                {"achievement_name": "Best Mouser"},
                {"achievement_name": "Napper"}
            ]
        })))
        .unwrap();

    let updated = service
        .update_cat(
            cat.id,
            cat_payload(json!({"achievements": [{"achievement_name": "Climber"}]})),
        )
        .unwrap();

    let names: Vec<&str> = updated
        .achievements
        .iter()
        .map(|achievement| achievement.achievement_name.as_str())
        .collect();
    assert_eq!(names, vec!["Climber"]);

    let all: Vec<String> = service
        .list_achievements()
        .unwrap()
        .into_iter()
        .map(|achievement| achievement.achievement_name)
        .collect();
    assert_eq!(all, vec!["Best Mouser", "Napper", "Climber"]);
}

#[test]
fn update_with_unknown_owner_changes_nothing() {
    let mut conn = setup();
    let mut service = KittygramService::with_year_source(&mut conn, year_2026);
    seed_smith(&mut service);
    let cat = service
        .create_cat(cat_payload(json!({
            "name": "Tom",
            "color": "black",
            "birth_year": 2020,
            "owner": "Smith",
            "achievements": []
        })))
        .unwrap();

    let err = service
        .update_cat(
            cat.id,
            cat_payload(json!({"name": "Tommy", "owner": "Nobody"})),
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let stored = service.get_cat(cat.id).unwrap().unwrap();
    assert_eq!(stored, cat);
}

#[test]
fn update_missing_cat_returns_not_found() {
    let mut conn = setup();
    let mut service = KittygramService::with_year_source(&mut conn, year_2026);

    let err = service
        .update_cat(404, cat_payload(json!({"name": "Ghost"})))
        .unwrap_err();
    assert!(matches!(err, ServiceError::CatNotFound(404)));
}

#[test]
fn failed_link_insert_rolls_back_the_cat() {
    let mut conn = setup();
    conn.execute_batch(
        "CREATE TRIGGER reject_links BEFORE INSERT ON achievement_cats
         BEGIN
             SELECT RAISE(ABORT, 'links disabled');
         END;",
    )
    .unwrap();
    {
        let mut service = KittygramService::with_year_source(&mut conn, year_2026);
        seed_smith(&mut service);

        let err = service
            .create_cat(cat_payload(json!({
                "name": "Tom",
                "color": "black",
                "birth_year": 2020,
                "owner": "Smith",
                "achievements": [{"achievement_name": "Best Mouser"}]
            })))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Repo(_)));
    }
    assert_eq!(count(&conn, "cats"), 0);
    assert_eq!(count(&conn, "achievements"), 0);
    assert_eq!(count(&conn, "owners"), 1);
}

#[test]
fn list_cats_filters_by_color() {
    let mut conn = setup();
    let mut service = KittygramService::with_year_source(&mut conn, year_2026);
    seed_smith(&mut service);
    for (name, color) in [("Tom", "black"), ("Snow", "white"), ("Ash", "black")] {
        service
            .create_cat(cat_payload(json!({
                "name": name,
                "color": color,
                "birth_year": 2020,
                "owner": "Smith",
                "achievements": []
            })))
            .unwrap();
    }

    let filter: CatSummaryPayload = serde_json::from_value(json!({"color": "black"})).unwrap();
    let black = service.list_cats(&filter.validate().unwrap()).unwrap();
    let names: Vec<&str> = black.iter().map(|cat| cat.name.as_str()).collect();
    assert_eq!(names, vec!["Tom", "Ash"]);

    let all = service
        .list_cats(&CatSummaryPayload::default().validate().unwrap())
        .unwrap();
    assert_eq!(all.len(), 3);

    let invalid: CatSummaryPayload = serde_json::from_value(json!({"color": "Black"})).unwrap();
    assert!(invalid.validate().unwrap_err().contains("color"));
}

#[test]
fn delete_cat_removes_links_and_reports_missing() {
    let mut conn = setup();
    {
        let mut service = KittygramService::with_year_source(&mut conn, year_2026);
        seed_smith(&mut service);
        let cat = service
            .create_cat(cat_payload(json!({
                "name": "Tom",
                "color": "black",
                "birth_year": 2020,
                "owner": "Smith",
                "achievements": [{"achievement_name": "Napper"}]
            })))
            .unwrap();

        service.delete_cat(cat.id).unwrap();
        assert_eq!(service.get_cat(cat.id).unwrap(), None);
        assert!(matches!(
            service.delete_cat(cat.id).unwrap_err(),
            ServiceError::CatNotFound(_)
        ));
    }
    assert_eq!(count(&conn, "achievement_cats"), 0);
    assert_eq!(count(&conn, "achievements"), 1);
}

#[test]
fn malformed_payload_is_reported_before_any_write() {
    let err = kittygram_core::parse_payload::<CatPayload>(r#"{"birth_year": "soon"}"#)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Malformed(_)));
    assert_eq!(err.code(), "malformed_payload");
}
