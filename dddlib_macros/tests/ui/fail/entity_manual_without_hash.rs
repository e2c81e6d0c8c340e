use dddlib_core::{Entity, Identifiable};

// Equality without hashing does not satisfy the entity contract.
#[derive(PartialEq, Eq)]
struct Half {
    id: Option<i64>,
}

impl Identifiable for Half {
    type Key = i64;
    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Entity for Half {}

fn main() {}
