#[macro_use]
extern crate rocket;

#[launch]
fn rocket() -> _ {
    account_api::rocket()
}
