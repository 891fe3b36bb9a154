pub mod film;
pub mod film_translation;
pub mod newsletter_subscriber;
pub mod remarkable_staff;
