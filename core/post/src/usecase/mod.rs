//! ユースケース: 文脈の集約・投稿判断・投稿ループ

pub mod aggregate;
pub mod decide;
pub mod post_loop;
