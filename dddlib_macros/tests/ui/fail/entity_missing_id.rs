use dddlib_macros::Entity;

#[derive(Entity)]
struct NoId {
    #[entity(key)]
    name: String,
}

fn main() {}
