use std::net::{SocketAddr, TcpListener};
use tracing::warn;

/// 检查端口是否可用（实际检测系统端口占用）
pub fn is_port_available(port: u16) -> bool {
    // 先检查 0.0.0.0（所有接口），这是最严格的检查
    // 如果能绑定 0.0.0.0，说明端口确实可用
    match TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))) {
        Ok(listener) => {
            // 显式drop以立即释放端口
            drop(listener);
            true
        }
        Err(_) => {
            // 如果 0.0.0.0 绑定失败，再尝试 127.0.0.1
            // 这可以检测是否只是权限问题（某些系统上普通用户无法绑定 0.0.0.0）
            match TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port))) {
                Ok(listener) => {
                    drop(listener);
                    // 能绑定本地回环但不能绑定所有接口，可能是权限限制
                    warn!("端口 {} 只能绑定到 127.0.0.1，可能存在权限限制", port);
                    true
                }
                Err(_) => {
                    // 连本地回环都绑定不了，端口确实被占用
                    false
                }
            }
        }
    }
}

/// 检查端口是否已有进程监听
pub fn is_port_bound(port: u16) -> bool {
    !is_port_available(port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_bound_port_detected() {
        // 绑定一个临时端口后应被检测为已占用
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(is_port_bound(port));
        drop(listener);
    }

    #[test]
    fn test_free_port_detected() {
        // 先拿到一个系统分配的端口再释放，紧接着检测应为可用
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        assert!(is_port_available(port));
    }
}
