//! `fm-traffic`: lane reservation arbitration.
//!
//! # Crate layout
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`lane`]        | `LaneKey`, the directed lane identity                |
//! | [`arbitrator`]  | `TrafficArbitrator`, `TrafficSnapshot`                |
//!
//! # Reservation model
//!
//! A corridor between vertices `a` and `b` may be held by one robot at a
//! time, whichever direction it travels.  Holders are recorded under the
//! directed key the robot asked for; a request conflicts with a holder of
//! either `(a, b)` or `(b, a)`.  Denied requesters join the FIFO queue of
//! their directed key and are promoted, oldest first, when a holder
//! releases.
//!
//! All state lives behind one mutex, so a release and the promotion it
//! triggers are atomic with respect to competing requests.

pub mod arbitrator;
pub mod lane;


pub use arbitrator::{TrafficArbitrator, TrafficSnapshot};
pub use lane::LaneKey;
