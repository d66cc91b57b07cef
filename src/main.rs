use rocket::launch;

#[launch]
fn rocket() -> _ {
    let rocket = coach_api::rocket();
    log::info!("starting coach api server");
    rocket
}
