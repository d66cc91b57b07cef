use coach_api::api_routes;
use coach_api::auth::Role;
use coach_api::coach::{CourseReport, Dashboard, StudentProgress};
use coach_api::school::get_or_create_school;
use coach_api::test_support::{
    TestFixtures, TestRocketBuilder, bearer, database_or_skip, test_auth_state,
};
use rocket::http::Status;

const ALGEBRA: &str = "course-v1:Org+Alg101+2024";
const BIOLOGY: &str = "course-v1:Org+Bio101+2024";

#[tokio::test]
async fn coach_reports_are_scoped_to_their_school() {
    let Some(test_db) = database_or_skip("coach report test").await else {
        return;
    };
    let pool = test_db.pool_clone();
    let auth = test_auth_state();
    let fixtures = TestFixtures::new(&pool);

    let (north, south) = {
        let mut conn = pool.acquire().await.expect("connection");
        let north = get_or_create_school(&mut conn, "North High").await.expect("school");
        let south = get_or_create_school(&mut conn, "South High").await.expect("school");
        (north, south)
    };

    fixtures.insert_course(ALGEBRA, "Algebra I").await.expect("course");
    fixtures.insert_course(BIOLOGY, "Biology").await.expect("course");

    let coach = fixtures.insert_user("coach", Role::User, "x").await.expect("user");
    fixtures
        .insert_profile(coach, "Coach", true, Some(north.id))
        .await
        .expect("profile");

    let zoe = fixtures.insert_user("zoe", Role::User, "x").await.expect("user");
    fixtures.insert_profile(zoe, "Zoe", false, Some(north.id)).await.expect("profile");
    let adam = fixtures.insert_user("adam", Role::User, "x").await.expect("user");
    fixtures.insert_profile(adam, "Adam", false, Some(north.id)).await.expect("profile");
    let outsider = fixtures.insert_user("outsider", Role::User, "x").await.expect("user");
    fixtures
        .insert_profile(outsider, "Outsider", false, Some(south.id))
        .await
        .expect("profile");

    for user in [zoe, adam, outsider] {
        fixtures.enroll(user, ALGEBRA).await.expect("enroll");
    }
    fixtures.enroll(zoe, BIOLOGY).await.expect("enroll");
    fixtures.enroll(coach, BIOLOGY).await.expect("enroll");

    fixtures
        .insert_course_grade(zoe, ALGEBRA, 0.85, "")
        .await
        .expect("grade");
    fixtures
        .insert_subsection_grade(zoe, ALGEBRA, (2, "Equations"), (1, "Linear"), Some("Homework"), 4.0, 5.0)
        .await
        .expect("subsection");
    fixtures
        .insert_subsection_grade(zoe, ALGEBRA, (1, "Numbers"), (2, "Fractions"), Some("Exam"), 9.0, 10.0)
        .await
        .expect("subsection");
    fixtures
        .insert_subsection_grade(zoe, ALGEBRA, (1, "Numbers"), (1, "Integers"), None, 0.0, 0.0)
        .await
        .expect("subsection");

    let client = TestRocketBuilder::new()
        .manage_pg_pool(pool.clone())
        .manage_auth(auth.clone())
        .mount_api_routes(api_routes())
        .async_client()
        .await;
    let coach_auth = bearer(&auth, coach, "coach", Role::User);

    let response = client
        .get("/api/v1/coach")
        .header(coach_auth.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let dashboard: Dashboard = response.into_json().await.expect("dashboard payload");
    let usernames: Vec<&str> = dashboard.students.iter().map(|s| s.username.as_str()).collect();
    assert_eq!(usernames, vec!["adam", "zoe"]);
    let courses: Vec<&str> = dashboard.courses.iter().map(|c| c.display_name.as_str()).collect();
    assert_eq!(courses, vec!["Algebra I", "Biology"]);
    assert_eq!(dashboard.enrollments.get("Algebra I"), Some(&2));
    assert_eq!(dashboard.enrollments.get("Biology"), Some(&1));

    let response = client
        .get(format!("/api/v1/coach/reports/{ALGEBRA}"))
        .header(coach_auth.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let report: CourseReport = response.into_json().await.expect("report payload");
    assert_eq!(report.course.display_name, "Algebra I");
    let letters: Vec<&str> = report.ordered_grades.iter().map(|g| g.letter.as_str()).collect();
    assert_eq!(letters, vec!["A", "B", "Pass"]);
    assert_eq!(report.students.len(), 2);
    assert_eq!(report.students[0].username, "adam");
    assert_eq!(report.students[0].grade_summary.percent, 0.0);
    assert!(report.students[0].grade_summary.grade.is_none());
    assert_eq!(report.students[1].username, "zoe");
    assert_eq!(report.students[1].grade_summary.grade.as_deref(), Some("B"));
    assert!(report.students[1].grade_summary.passed);
    assert_eq!(report.students[1].grade_summary.section_breakdown.len(), 2);

    let response = client
        .get(format!("/api/v1/coach/reports/{ALGEBRA}/{zoe}"))
        .header(coach_auth.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let progress: StudentProgress = response.into_json().await.expect("progress payload");
    assert_eq!(progress.student.username, "zoe");
    let chapters: Vec<&str> = progress
        .courseware_summary
        .iter()
        .map(|c| c.display_name.as_str())
        .collect();
    assert_eq!(chapters, vec!["Numbers", "Equations"]);
    assert_eq!(progress.courseware_summary[0].sections[0].display_name, "Integers");

    let response = client
        .get(format!("/api/v1/coach/reports/{ALGEBRA}/{outsider}"))
        .header(coach_auth.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);

    drop(response);
    let response = client
        .get("/api/v1/coach/reports/course-v1:Org+Missing+2024")
        .header(coach_auth.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);

    drop(response);
    let response = client
        .get("/api/v1/coach/reports/not-a-course-key")
        .header(coach_auth)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    drop(response);
    drop(client);
    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn non_coaches_are_forbidden() {
    let Some(test_db) = database_or_skip("coach access test").await else {
        return;
    };
    let pool = test_db.pool_clone();
    let auth = test_auth_state();
    let fixtures = TestFixtures::new(&pool);

    let learner = fixtures.insert_user("learner", Role::User, "x").await.expect("user");
    fixtures.insert_profile(learner, "Learner", false, None).await.expect("profile");
    let homeless = fixtures.insert_user("homeless", Role::User, "x").await.expect("user");
    fixtures.insert_profile(homeless, "Coach", true, None).await.expect("profile");

    let client = TestRocketBuilder::new()
        .manage_pg_pool(pool.clone())
        .manage_auth(auth.clone())
        .mount_api_routes(api_routes())
        .async_client()
        .await;

    for (id, name) in [(learner, "learner"), (homeless, "homeless")] {
        let response = client
            .get("/api/v1/coach")
            .header(bearer(&auth, id, name, Role::User))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden, "{name} must be rejected");
    }

    let response = client.get("/api/v1/coach").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);

    drop(response);
    drop(client);
    test_db.close().await.expect("failed to drop test database");
}
