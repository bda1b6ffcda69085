//! シナリオテスト（ネットワークは EchoProvider で代替）

mod post_loop_tests;
