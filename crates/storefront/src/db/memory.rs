//! In-memory [`CheckoutStore`] for unit tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use gogi_core::{
    AddressId, CartItemId, OrderId, OrderItemId, OrderStatus, ProductId, Quantity, UserId, Won,
};

use super::{CheckoutStore, CreateOrderError, RepositoryError};
use crate::models::{
    Address, CartItem, CartLine, NewOrder, Order, OrderDetails, OrderItem, Product,
};

#[derive(Default)]
struct State {
    next_id: i32,
    products: Vec<Product>,
    cart: Vec<CartItem>,
    addresses: Vec<Address>,
    orders: Vec<Order>,
    items: Vec<OrderItem>,
    create_order_calls: usize,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryCheckoutStore {
    state: Mutex<State>,
}

impl MemoryCheckoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_product(&self, name: &str, price: i64) -> ProductId {
        let mut state = self.state();
        let id = ProductId::new(state.next_id());
        state.products.push(Product {
            id,
            name: name.to_owned(),
            description: None,
            price: Won::new(price),
            image_url: None,
            owner_id: None,
            created_at: Utc::now(),
        });
        id
    }

    pub fn set_price(&self, id: ProductId, price: i64) {
        let mut state = self.state();
        if let Some(product) = state.products.iter_mut().find(|p| p.id == id) {
            product.price = Won::new(price);
        }
    }

    pub fn remove_product(&self, id: ProductId) {
        self.state().products.retain(|p| p.id != id);
    }

    pub fn add_to_cart(&self, user_id: UserId, product_id: ProductId, quantity: u32) {
        let mut state = self.state();
        let id = CartItemId::new(state.next_id());
        let quantity = Quantity::new(quantity).unwrap_or(Quantity::ONE);
        state.cart.retain(|c| !(c.user_id == user_id && c.product_id == product_id));
        state.cart.push(CartItem {
            id,
            user_id,
            product_id,
            quantity,
            created_at: Utc::now(),
        });
    }

    pub fn add_address(&self, user_id: UserId) -> AddressId {
        let mut state = self.state();
        let id = AddressId::new(state.next_id());
        state.addresses.push(Address {
            id,
            user_id,
            label: "Home".to_owned(),
            receiver_name: "Kim Minji".to_owned(),
            phone: "010-1234-5678".to_owned(),
            postal_code: "06236".to_owned(),
            address1: "Teheran-ro 152".to_owned(),
            address2: String::new(),
            is_default: false,
            created_at: Utc::now(),
        });
        id
    }

    pub fn cart_len(&self, user_id: UserId) -> usize {
        self.state().cart.iter().filter(|c| c.user_id == user_id).count()
    }

    pub fn order_count(&self) -> usize {
        self.state().orders.len()
    }

    pub fn create_order_calls(&self) -> usize {
        self.state().create_order_calls
    }

    fn details(state: &State, order: &Order) -> OrderDetails {
        OrderDetails {
            order: order.clone(),
            items: state
                .items
                .iter()
                .filter(|i| i.order_id == order.id)
                .cloned()
                .collect(),
            shipping_address: order
                .shipping_address_id
                .and_then(|id| state.addresses.iter().find(|a| a.id == id).cloned()),
        }
    }
}

#[async_trait]
impl CheckoutStore for MemoryCheckoutStore {
    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let state = self.state();
        Ok(state
            .cart
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .map(|c| CartLine {
                item: c.clone(),
                product: state.products.iter().find(|p| p.id == c.product_id).cloned(),
            })
            .collect())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.state().products.iter().find(|p| p.id == id).cloned())
    }

    async fn address_for_user(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        Ok(self
            .state()
            .addresses
            .iter()
            .find(|a| a.id == id && a.user_id == user_id)
            .cloned())
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, CreateOrderError> {
        let mut state = self.state();
        state.create_order_calls += 1;

        if order.consumes_cart {
            let mut current: Vec<(ProductId, Quantity)> = state
                .cart
                .iter()
                .filter(|c| c.user_id == order.user_id)
                .map(|c| (c.product_id, c.quantity))
                .collect();
            let mut expected: Vec<(ProductId, Quantity)> = order
                .items
                .iter()
                .map(|i| (i.product_id, i.quantity))
                .collect();
            current.sort_unstable();
            expected.sort_unstable();
            if current != expected {
                return Err(CreateOrderError::CartChanged);
            }
        }

        if let Some(payment) = &order.payment {
            let taken = state
                .orders
                .iter()
                .any(|o| o.payment_uid.as_deref() == Some(payment.imp_uid.as_str()));
            if taken {
                return Err(CreateOrderError::DuplicatePayment(payment.imp_uid.clone()));
            }
        }

        let created = Order {
            id: OrderId::new(state.next_id()),
            user_id: order.user_id,
            status: order.status.clone(),
            total_amount: order.total_amount,
            shipping_address_id: order.shipping_address_id,
            payment_uid: order.payment.as_ref().map(|p| p.imp_uid.clone()),
            merchant_uid: order.payment.as_ref().and_then(|p| p.merchant_uid.clone()),
            created_at: Utc::now(),
        };

        for item in &order.items {
            let id = OrderItemId::new(state.next_id());
            let product_name = state
                .products
                .iter()
                .find(|p| p.id == item.product_id)
                .map(|p| p.name.clone());
            state.items.push(OrderItem {
                id,
                order_id: created.id,
                product_id: Some(item.product_id),
                product_name,
                quantity: item.quantity,
                price: item.price,
            });
        }

        if order.consumes_cart {
            state.cart.retain(|c| c.user_id != order.user_id);
        }
        state.orders.push(created.clone());
        Ok(created)
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut state = self.state();
        Ok(state.orders.iter_mut().find(|o| o.id == id).map(|o| {
            o.status = status.clone();
            o.clone()
        }))
    }

    async fn order_details(&self, id: OrderId) -> Result<Option<OrderDetails>, RepositoryError> {
        let state = self.state();
        Ok(state
            .orders
            .iter()
            .find(|o| o.id == id)
            .map(|o| Self::details(&state, o)))
    }

    async fn order_by_payment_uid(&self, imp_uid: &str) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .state()
            .orders
            .iter()
            .find(|o| o.payment_uid.as_deref() == Some(imp_uid))
            .cloned())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderDetails>, RepositoryError> {
        let state = self.state();
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .map(|o| Self::details(&state, o))
            .collect())
    }
}
