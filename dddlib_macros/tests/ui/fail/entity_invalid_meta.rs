use dddlib_macros::Entity;

#[derive(Entity)]
struct Bad {
    #[entity(id)]
    id: Option<i64>,
    #[entity(primary)]
    name: String,
}

fn main() {}
