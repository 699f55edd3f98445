pub mod generator;
pub mod handlers;
pub mod mapper;
pub mod renderer;
pub mod storage;

#[cfg(test)]
pub mod test_support;
