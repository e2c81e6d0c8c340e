use dddlib_core::{Entity as _, HashCodeBuilder};
use dddlib_macros::Entity;

#[derive(Entity)]
#[entity(hash_seeds(17, 43))]
struct Service {
    #[entity(id)]
    id: Option<u32>,
    #[entity(key)]
    name: String,
}

fn main() {
    let s = Service { id: None, name: "MyService23".into() };
    let expected = HashCodeBuilder::new(17, 43).append(&s.name).to_hash_code();
    assert_eq!(s.hash_code(), expected);
    let _ = s.id;
}
