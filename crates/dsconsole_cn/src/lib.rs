//! # dsconsole Component Library (dsconsole_cn)
//!
//! Headless form components for the directory server console.
//!
//! Components are split into a pure state machine and a thin host adapter:
//!
//! - **State machine**: `(state, event) -> (state, outputs)`, no callbacks, no timers
//! - **Host adapter**: runs the machine, invokes caller callbacks, owns timers
//! - **View model**: a render-ready snapshot with ids and ARIA wiring
//!
//! ## Example
//!
//! ```
//! use dsconsole_cn::prelude::*;
//!
//! let select = cn::typeahead_select(Vec::<String>::new())
//!     .with_key("group-attr")
//!     .multi(true)
//!     .options(["member", "memberCertificate", "uniqueMember"])
//!     .on_select(|selection| println!("selected: {:?}", selection.values()))
//!     .build();
//!
//! select.dispatch(SelectEvent::InputClick);
//! select.dispatch(SelectEvent::OptionClick(2));
//! assert_eq!(select.selection().values(), vec!["uniqueMember"]);
//! ```
//!
//! ## Components
//!
//! - **TypeaheadSelect** - filterable single/multi select with create-on-the-fly

pub mod components;

pub use components::*;

/// Convenience module for accessing components with `cn::` prefix
pub mod cn {
    pub use crate::components::typeahead::typeahead_select;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cn;
    pub use crate::components::typeahead::{
        typeahead_select, Candidate, CreateValidation, SelectConfig, SelectEvent, SelectOption,
        SelectOutput, SelectState, SelectTuning, SelectView, SelectedInput, Selection,
        TypeaheadSelect, TypeaheadSelectBuilder, Validated,
    };
    pub use dsconsole_core::{Key, TimerHandle, TimerScheduler};
}
