//! Document paths used by the back-office core.

use common::CustomerId;
use document_store::{CollectionPath, DocumentPath};

use crate::FulfillmentStage;

pub const USERS: &str = "users";
pub const TRANSACTIONS: &str = "transaction";
pub const PRODUCTS: &str = "products";
pub const PRODUCT_IMAGES: &str = "images/products";

/// `users`
pub fn users() -> CollectionPath {
    CollectionPath::root(USERS)
}

/// `users/{customerId}`
pub fn customer(id: &CustomerId) -> DocumentPath {
    users().doc(id.as_str())
}

/// `users/{customerId}/profile/details`
pub fn profile(id: &CustomerId) -> DocumentPath {
    customer(id).collection("profile").doc("details")
}

/// `users/{customerId}/orders`
pub fn orders(id: &CustomerId) -> CollectionPath {
    stage_collection(id, FulfillmentStage::Placed)
}

/// The collection holding a stage's documents for one customer.
pub fn stage_collection(id: &CustomerId, stage: FulfillmentStage) -> CollectionPath {
    customer(id).collection(stage.collection_id())
}

/// The single stage record of a customer, keyed by the customer id.
pub fn stage_record(id: &CustomerId, stage: FulfillmentStage) -> DocumentPath {
    stage_collection(id, stage).doc(id.as_str())
}

/// Finds the customer owning `path`, at any depth below `users`.
pub fn customer_of(path: &DocumentPath) -> Option<CustomerId> {
    let mut doc = path.clone();
    while let Some(owner) = doc.parent().parent() {
        doc = owner;
    }
    (doc.parent().as_str() == USERS).then(|| CustomerId::new(doc.id()))
}

/// `transaction`
pub fn transactions() -> CollectionPath {
    CollectionPath::root(TRANSACTIONS)
}

/// `transaction/{customerId}`, the revenue ledger entry for a delivered customer.
pub fn ledger_entry(id: &CustomerId) -> DocumentPath {
    transactions().doc(id.as_str())
}

/// `products`
pub fn products() -> CollectionPath {
    CollectionPath::root(PRODUCTS)
}

/// Storage reference of a product image.
pub fn image_ref(image_name: &str) -> String {
    format!("{PRODUCT_IMAGES}/{image_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_paths_are_keyed_by_customer() {
        let id = CustomerId::new("C1");
        assert_eq!(orders(&id).as_str(), "users/C1/orders");
        assert_eq!(
            stage_record(&id, FulfillmentStage::Shipped).to_string(),
            "users/C1/orderShipped/C1"
        );
        assert_eq!(
            stage_record(&id, FulfillmentStage::Delivered).to_string(),
            "users/C1/orderDelivered/C1"
        );
    }

    #[test]
    fn ledger_and_profile_paths() {
        let id = CustomerId::new("C1");
        assert_eq!(ledger_entry(&id).to_string(), "transaction/C1");
        assert_eq!(profile(&id).to_string(), "users/C1/profile/details");
        assert_eq!(image_ref("kibble.png"), "images/products/kibble.png");
    }

    #[test]
    fn customer_of_walks_up_to_users() {
        let id = CustomerId::new("C1");
        assert_eq!(customer_of(&customer(&id)), Some(id.clone()));
        assert_eq!(customer_of(&orders(&id).doc("o1")), Some(id.clone()));
        assert_eq!(customer_of(&profile(&id)), Some(id.clone()));
        assert_eq!(customer_of(&ledger_entry(&id)), None);
        assert_eq!(customer_of(&products().doc("p1")), None);
    }
}
