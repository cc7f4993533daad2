mod contact_message;
mod email_address;
mod newsletter;
mod person_name;
mod subscriber;
mod validation;
// allow external `use` statements to skip `subscriber` etc
pub use contact_message::ContactMessage;
pub use contact_message::MessageStatus;
pub use contact_message::NewContactMessage;
pub use email_address::EmailAddress;
pub use newsletter::NewNewsletter;
pub use newsletter::Newsletter;
pub use newsletter::RecipientsFilter;
pub use person_name::PersonName;
pub use subscriber::Subscriber;
pub use subscriber::SubscriberStatus;
pub use validation::validate_email;
pub use validation::validate_length;
pub use validation::validate_required;
pub use validation::ValidationError;
