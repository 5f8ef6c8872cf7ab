pub mod conversations;
pub mod messages;
pub mod order_items;
pub mod orders;
pub mod users;

pub use conversations::Entity as Conversations;
pub use messages::Entity as Messages;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use users::Entity as Users;
