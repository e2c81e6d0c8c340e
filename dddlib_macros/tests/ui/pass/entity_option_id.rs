use dddlib_core::Identifiable;
use dddlib_macros::Entity;

#[derive(Entity, Clone, Debug)]
struct Article {
    #[entity(id)]
    id: Option<i64>,
    #[entity(key)]
    slug: String,
    title: String,
}

fn main() {
    let a = Article { id: Some(5), slug: "hello".into(), title: "Hello".into() };
    let id: Option<<Article as Identifiable>::Key> = a.id();
    assert_eq!(id, Some(5));

    // Title is not part of the business key.
    let b = Article { id: None, slug: "hello".into(), title: "Hi".into() };
    assert_eq!(a, b);
    assert_eq!(b.id(), None);
    let _ = (a.title, b.title);
}
