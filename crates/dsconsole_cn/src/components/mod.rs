//! Component implementations

pub mod typeahead;

pub use typeahead::{
    typeahead_select, Candidate, CreateValidation, SelectConfig, SelectEvent, SelectOption,
    SelectOutput, SelectState, SelectTuning, SelectView, SelectedInput, Selection,
    TypeaheadSelect, TypeaheadSelectBuilder, Validated,
};
