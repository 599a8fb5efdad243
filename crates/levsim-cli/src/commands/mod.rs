pub mod leveraged;
