use snafu::Snafu;

use crate::image::ParseImageReferenceError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Invalid sidecar image '{image}', error: {source}"))]
    InvalidImage { image: String, source: ParseImageReferenceError },
}
