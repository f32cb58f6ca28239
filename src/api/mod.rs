pub mod constants;
pub mod dispatcher;
pub mod errors;
pub mod functions;
pub mod impls;
pub mod traits;
pub mod types;

pub use errors::{ClientError, DispatchError, EncodingError, TransportError};
pub use traits::{Encoder, Sender};
pub use types::{
    CrptApi, DispatchReport, Dispatcher, HttpSender, JsonEncoder, OutboundRequest, Outcome,
    SenderResponse, Submission,
};
