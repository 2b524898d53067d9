pub mod chunking;
