pub mod sqs_queue;
