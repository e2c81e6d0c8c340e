use dddlib_macros::Entity;

#[derive(Entity)]
struct TwoIds {
    #[entity(id)]
    id1: i64,
    #[entity(id)]
    id2: i64,
    #[entity(key)]
    name: String,
}

fn main() {}
