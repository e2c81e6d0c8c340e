use dddlib_macros::Entity;

// No business key: there is nothing to define equality over.
#[derive(Entity)]
struct Keyless {
    #[entity(id)]
    id: Option<i64>,
    name: String,
}

fn main() {}
