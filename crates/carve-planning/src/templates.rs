//! Template PRDs for demos and tests

/// A multi-context commerce PRD exercising every extraction strategy family
pub fn example_prd() -> String {
    r#"# Project: ShopFlow

ShopFlow is an online store where customers browse products, place orders and pay at checkout.

## Technology

- Language: Python with FastAPI
- Database: PostgreSQL
- Messaging: RabbitMQ for domain events
- Auth: JWT bearer tokens
- Payments: Stripe
- Email: SendGrid
- REST API, deployed with Docker on Kubernetes

## Service: Identity

Manages customer accounts and sign-in.

### Customer
- id: UUID
- email: string
- name: string
- created_at: datetime

## Service: Catalog

Owns the product catalog.

### Product
- id: UUID
- title: string
- price: decimal
- stock: int

### Category
- id: UUID
- name: string

## Service: Ordering

Takes orders and tracks fulfilment.

### Order
- id: UUID
- customer_id: UUID
- total: decimal
- status: string

### LineItem
- id: UUID
- product_id: UUID
- quantity: int

## Service: Payments

Captures card payments for orders.

### Payment
- id: UUID
- order_id: UUID
- amount: decimal
- status: string

## Relationships

- Customer has many Order
- Order contains LineItem
- LineItem references Product
- Category has many Product
- Payment references Order

## Lifecycles

Order status: pending, paid, shipped, delivered

Payment status: pending -> authorized -> captured
"#
    .to_string()
}

/// Smallest useful PRD: one entity described in a sentence
pub fn minimal_prd(project_name: impl Into<String>) -> String {
    let name = project_name.into();
    format!(
        "# {name}\n\n## Overview\n\n{name} is a small service. The system manages Users which have an email, a display_name and a created_at.\n"
    )
}

/// Terse PRD written as inline lists and lowercase sentences
pub fn terse_prd() -> String {
    "Task tracker for small teams, written in Golang with MongoDB.\n\
     Core entities: Board, Task, Comment, Tag.\n\
     each board has many tasks. each task belongs to a board. a comment is linked to a task.\n\
     Task transitions from todo to doing. Task transitions from doing to done.\n"
        .to_string()
}
