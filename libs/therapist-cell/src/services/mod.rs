pub mod therapist;

pub use therapist::TherapistService;
