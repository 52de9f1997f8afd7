//! Ports - 抽象化レイヤー
//!
//! ゲートが外部（ネットワーク）と接する境界を trait として定義します。

pub mod transport;

pub use self::transport::Transport;
