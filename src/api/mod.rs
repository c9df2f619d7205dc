mod firebase_auth;
mod firestore;
mod gemini;
mod memory;

pub use firebase_auth::FirebaseAuth;
pub use firestore::FirestoreApi;
pub use gemini::GeminiApi;
pub use memory::MemoryStore;
