//! Extensions to `k8s_openapi` types.
//!
//! `PodExt` gives typed access to the parts of a pod the injector reads and
//! owns the one mutation it performs on the pod itself: adding the socket
//! volume.

mod pod;

pub use self::pod::PodExt;
