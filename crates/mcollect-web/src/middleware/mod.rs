//! 요청/응답 미들웨어.

pub mod signature;
