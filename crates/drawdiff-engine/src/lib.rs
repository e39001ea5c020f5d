// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// drawdiff-engine — Compares two revisions of a drawing and packages the
// result.
//
// Tokens extracted by `drawdiff-document` are matched page by page, de-noised
// by the cross filter, marked onto working copies, and assembled into one of
// the output variants.

pub mod archive;
pub mod filter;
pub mod matcher;
pub mod packager;
pub mod pipeline;

pub use filter::CrossFilter;
pub use matcher::TokenMatcher;
pub use packager::{Comparer, Deliverable, SummaryOutcome};
pub use pipeline::{PageOutcomes, Session};
