//! Ambient pipeline adapter: wraps the pure verification core
//! ([`crate::gate`], [`crate::checker`]) in the [`GuardrailStage`]
//! interface so it can be composed into a multi-stage security pipeline
//! alongside other stages.
//!
//! ## Architecture
//!
//! ```text
//! Content ──► NiucStage::evaluate ──► gate::process ──► StageOutcome
//!                                        │
//!                                        ├─► Pass            -> Allow
//!                                        ├─► CertifiedRewrite -> Transform
//!                                        └─► Blocked          -> Block
//! ```
//!
//! `evaluate` is declared `async` purely for trait compatibility with
//! [`GuardrailStage`] — the verification core itself never awaits
//! anything; it is a synchronous, pure computation.
//!
//! ## Example
//!
//! ```rust,ignore
//! use niuc_core::pipeline::{NiucStage, executor::ExecutorBuilder};
//! use niuc_core::gate::RuntimeMode;
//!
//! let executor = ExecutorBuilder::new()
//!     .add_stage(NiucStage::new(RuntimeMode::CertifiedRewrite))
//!     .build();
//! ```

pub mod content;
pub mod executor;
pub mod niuc_stage;
pub mod outcome;
pub mod stage;

pub use niuc_stage::NiucStage;
