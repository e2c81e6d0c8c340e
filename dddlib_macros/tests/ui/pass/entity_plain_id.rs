use dddlib_core::{Entity as _, Identifiable};
use dddlib_macros::Entity;

#[derive(Entity)]
struct Country {
    #[entity(id)]
    code: String,
    #[entity(key)]
    iso: String,
    #[entity(key)]
    region: u8,
}

fn main() {
    let c = Country { code: "cn".into(), iso: "CHN".into(), region: 3 };
    assert_eq!(c.id(), Some("cn".to_string()));
    let d = Country { code: "xx".into(), iso: "CHN".into(), region: 3 };
    assert_eq!(c.hash_code(), d.hash_code());
}
