//! dsconsole Core
//!
//! Foundational primitives shared by the console's component library and
//! screens:
//!
//! - **Instance keys**: stable per-instance ids and DOM-safe id derivation
//! - **Key codes**: the keyboard keys form components react to
//! - **Deferred timers**: a virtual-clock scheduler for fire-and-forget callbacks
//! - **Validation**: pure checks for DNs, ports, hostnames, paths and ranges
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use dsconsole_core::scheduler::TimerScheduler;
//!
//! let scheduler = TimerScheduler::new();
//! let fired = Arc::new(AtomicBool::new(false));
//!
//! let flag = fired.clone();
//! scheduler
//!     .handle()
//!     .schedule(Duration::from_millis(10), move || flag.store(true, Ordering::SeqCst));
//!
//! scheduler.advance(Duration::from_millis(5));
//! assert!(!fired.load(Ordering::SeqCst));
//! scheduler.advance(Duration::from_millis(5));
//! assert!(fired.load(Ordering::SeqCst));
//! ```

pub mod events;
pub mod key;
pub mod scheduler;
pub mod validate;

pub use events::Key;
pub use key::{option_dom_id, sanitize_dom_id, InstanceKey};
pub use scheduler::{TimerHandle, TimerId, TimerScheduler};
pub use validate::{
    bad_file_name, file_is_path, is_valid_hostname, is_valid_ip_address, is_valid_ldap_url,
    lists_equal, parent_dn, valid_dn, valid_num_range, valid_port,
};
