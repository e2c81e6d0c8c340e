use dddlib_macros::Entity;

#[derive(Entity)]
#[entity(hash_seeds(16, 43))]
struct Even {
    #[entity(id)]
    id: Option<i64>,
    #[entity(key)]
    name: String,
}

fn main() {}
