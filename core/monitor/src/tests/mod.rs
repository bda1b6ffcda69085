//! シナリオテスト（ネットワークは EchoProvider で代替）

mod monitor_loop_tests;
