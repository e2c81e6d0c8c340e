use dddlib_macros::Entity;

#[derive(Entity)]
struct IdKey {
    #[entity(id, key)]
    id: Option<i64>,
}

fn main() {}
