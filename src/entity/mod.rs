pub mod categories;
pub mod chat_messages;
pub mod products;
pub mod user_roles;
pub mod vendors;

pub use categories::Entity as Categories;
pub use chat_messages::Entity as ChatMessages;
pub use products::Entity as Products;
pub use user_roles::Entity as UserRoles;
pub use vendors::Entity as Vendors;
