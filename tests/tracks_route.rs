use coach_api::api_routes;
use coach_api::auth::Role;
use coach_api::degree_track::{Degree, DegreeTrack, DegreeTrackDetail, ObjectiveWithPoints};
use coach_api::models::DataResponse;
use coach_api::routes::catalog::CourseSyncResponse;
use coach_api::test_support::{
    TestFixtures, TestRocketBuilder, bearer, database_or_skip, test_auth_state,
};
use rocket::http::{ContentType, Status};
use serde_json::json;

const CHEMISTRY: &str = "course-v1:Org+Chem101+2024";
const PHYSICS: &str = "course-v1:Org+Phys101+2024";

#[tokio::test]
async fn catalog_saves_keep_degrees_in_sync() {
    let Some(test_db) = database_or_skip("catalog sync test").await else {
        return;
    };
    let pool = test_db.pool_clone();
    let auth = test_auth_state();
    let admin_id = TestFixtures::new(&pool)
        .insert_user("operator", Role::Admin, "x")
        .await
        .expect("admin");
    let admin = bearer(&auth, admin_id, "operator", Role::Admin);

    let client = TestRocketBuilder::new()
        .manage_pg_pool(pool.clone())
        .manage_auth(auth)
        .mount_api_routes(api_routes())
        .async_client()
        .await;

    let response = client
        .put(format!("/api/v1/admin/catalog/courses/{CHEMISTRY}"))
        .header(admin.clone())
        .header(ContentType::JSON)
        .body(
            json!({
                "display_name": "Chemistry",
                "course_image_url": "/asset/chem.png",
                "short_description": "Atoms and bonds"
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let saved: CourseSyncResponse = response.into_json().await.expect("sync payload");
    assert_eq!(saved.degree, "created");
    assert_eq!(saved.course.grade_cutoffs.get("Pass"), Some(&0.5));

    let response = client
        .put(format!("/api/v1/admin/catalog/courses/{CHEMISTRY}"))
        .header(admin.clone())
        .header(ContentType::JSON)
        .body(json!({ "display_name": "General Chemistry" }).to_string())
        .dispatch()
        .await;
    let saved: CourseSyncResponse = response.into_json().await.expect("sync payload");
    assert_eq!(saved.degree, "updated");

    let response = client
        .get("/api/v1/admin/degrees?search=chem")
        .header(admin.clone())
        .dispatch()
        .await;
    let degrees: DataResponse<Vec<Degree>> = response.into_json().await.expect("degrees");
    assert_eq!(degrees.data.len(), 1);
    assert_eq!(degrees.data[0].course_id, CHEMISTRY);
    assert_eq!(degrees.data[0].name, "General Chemistry");
    assert_eq!(degrees.data[0].image_url, "");
    assert!(degrees.data[0].short_description.is_none());

    let response = client
        .put("/api/v1/admin/catalog/courses/chemistry")
        .header(admin.clone())
        .header(ContentType::JSON)
        .body(json!({ "display_name": "Chemistry" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    drop(response);
    let response = client
        .delete(format!("/api/v1/admin/catalog/courses/{CHEMISTRY}"))
        .header(admin.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM degrees")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(remaining, 0);

    drop(response);
    let response = client
        .delete(format!("/api/v1/admin/catalog/courses/{CHEMISTRY}"))
        .header(admin)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);

    drop(response);
    drop(client);
    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn tracks_and_objectives_round_trip_through_admin_routes() {
    let Some(test_db) = database_or_skip("degree track test").await else {
        return;
    };
    let pool = test_db.pool_clone();
    let auth = test_auth_state();
    let fixtures = TestFixtures::new(&pool);
    let admin_id = fixtures.insert_user("operator", Role::Admin, "x").await.expect("admin");
    let learner_id = fixtures.insert_user("learner", Role::User, "x").await.expect("user");
    let admin = bearer(&auth, admin_id, "operator", Role::Admin);
    let learner = bearer(&auth, learner_id, "learner", Role::User);

    let client = TestRocketBuilder::new()
        .manage_pg_pool(pool.clone())
        .manage_auth(auth)
        .mount_api_routes(api_routes())
        .async_client()
        .await;

    for (key, name) in [(PHYSICS, "Physics"), (CHEMISTRY, "Chemistry")] {
        let response = client
            .put(format!("/api/v1/admin/catalog/courses/{key}"))
            .header(admin.clone())
            .header(ContentType::JSON)
            .body(json!({ "display_name": name }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
    }

    let response = client
        .get("/api/v1/admin/degrees")
        .header(admin.clone())
        .dispatch()
        .await;
    let degrees: DataResponse<Vec<Degree>> = response.into_json().await.expect("degrees");
    let names: Vec<&str> = degrees.data.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Chemistry", "Physics"]);
    let ids: Vec<i32> = degrees.data.iter().map(|d| d.id).collect();

    let track_body = json!({
        "name": "Science",
        "short_description": "Natural sciences",
        "image": "science.png",
        "course_ids": [ids[1], ids[0], ids[1]]
    })
    .to_string();

    let response = client
        .post("/api/v1/admin/tracks")
        .header(learner.clone())
        .header(ContentType::JSON)
        .body(track_body.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    drop(response);
    let response = client
        .post("/api/v1/admin/tracks")
        .header(admin.clone())
        .header(ContentType::JSON)
        .body(track_body)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let track: DegreeTrackDetail = response.into_json().await.expect("track");
    assert_eq!(track.track.image, "tracks/science.png");
    let course_names: Vec<&str> = track.courses.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(course_names, vec!["Chemistry", "Physics"]);

    let response = client
        .post("/api/v1/admin/tracks")
        .header(admin.clone())
        .header(ContentType::JSON)
        .body(
            json!({
                "name": "Ghost",
                "short_description": "Nothing",
                "image": "ghost.png",
                "course_ids": [999_999]
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    drop(response);
    let response = client.get("/api/v1/tracks").dispatch().await;
    let tracks: DataResponse<Vec<DegreeTrack>> = response.into_json().await.expect("tracks");
    assert_eq!(tracks.data.len(), 1);
    assert_eq!(tracks.data[0].name, "Science");

    let track_id = track.track.id;
    let response = client
        .put(format!("/api/v1/admin/tracks/{track_id}"))
        .header(admin.clone())
        .header(ContentType::JSON)
        .body(
            json!({
                "name": "Physical Science",
                "short_description": "Matter",
                "image": "tracks/physical.png",
                "course_ids": [ids[1]]
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    drop(response);
    let response = client.get(format!("/api/v1/tracks/{track_id}")).dispatch().await;
    let detail: DegreeTrackDetail = response.into_json().await.expect("track detail");
    assert_eq!(detail.track.name, "Physical Science");
    assert_eq!(detail.track.image, "tracks/physical.png");
    assert_eq!(detail.courses.len(), 1);
    assert_eq!(detail.courses[0].name, "Physics");

    let physics = ids[1];
    let response = client
        .post(format!("/api/v1/admin/degrees/{physics}/objectives"))
        .header(admin.clone())
        .header(ContentType::JSON)
        .body(json!({ "title": "Motion", "number": 2, "points": ["velocity", "acceleration"] }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let motion: ObjectiveWithPoints = response.into_json().await.expect("objective");
    let points: Vec<&str> = motion.points.iter().map(|p| p.point.as_str()).collect();
    assert_eq!(points, vec!["acceleration", "velocity"]);

    let response = client
        .post(format!("/api/v1/admin/degrees/{physics}/objectives"))
        .header(admin.clone())
        .header(ContentType::JSON)
        .body(json!({ "title": "Units", "number": 1 }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    drop(response);
    let response = client
        .put(format!("/api/v1/admin/objectives/{}", motion.objective.id))
        .header(admin.clone())
        .header(ContentType::JSON)
        .body(json!({ "title": "Kinematics", "number": 3, "points": ["displacement"] }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    drop(response);
    let response = client
        .get(format!("/api/v1/degrees/{physics}/objectives"))
        .dispatch()
        .await;
    let objectives: DataResponse<Vec<ObjectiveWithPoints>> =
        response.into_json().await.expect("objectives");
    let titles: Vec<&str> = objectives
        .data
        .iter()
        .map(|o| o.objective.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Units", "Kinematics"]);
    assert_eq!(objectives.data[1].points.len(), 1);
    assert_eq!(objectives.data[1].points[0].point, "displacement");

    let response = client.get("/api/v1/degrees/999999/objectives").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);

    drop(response);
    let response = client
        .delete(format!("/api/v1/admin/objectives/{}", motion.objective.id))
        .header(admin.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    drop(response);
    let response = client
        .delete(format!("/api/v1/admin/tracks/{track_id}"))
        .header(admin.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    drop(response);
    let response = client.get(format!("/api/v1/tracks/{track_id}")).dispatch().await;
    assert_eq!(response.status(), Status::NotFound);

    drop(response);
    drop(client);
    test_db.close().await.expect("failed to drop test database");
}
