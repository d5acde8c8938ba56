pub mod addresses;
pub mod bank_accounts;
pub mod cart_items;
pub mod categories;
pub mod order_items;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;

pub use addresses::Entity as Addresses;
pub use bank_accounts::Entity as BankAccounts;
pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payments::Entity as Payments;
pub use products::Entity as Products;
pub use users::Entity as Users;
