use get_if_addrs::get_if_addrs;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use tracing::warn;

/// Devine l'adresse IP locale de la machine.
///
/// Crée un socket UDP lié à `0.0.0.0:0` et le « connecte » vers `8.8.8.8:80` :
/// aucun paquet ne part (UDP est sans connexion), mais le système choisit
/// l'interface de sortie, dont on lit l'adresse.
///
/// # Returns
///
/// L'adresse IP locale, ou `127.0.0.1` si une étape échoue.
pub fn guess_local_ip() -> Ipv4Addr {
    let Ok(socket) = UdpSocket::bind("0.0.0.0:0") else {
        return Ipv4Addr::LOCALHOST;
    };
    if socket.connect("8.8.8.8:80").is_err() {
        return Ipv4Addr::LOCALHOST;
    }
    match socket.local_addr() {
        Ok(addr) => match addr.ip() {
            IpAddr::V4(ip) => ip,
            IpAddr::V6(_) => Ipv4Addr::LOCALHOST,
        },
        Err(_) => Ipv4Addr::LOCALHOST,
    }
}

/// Liste les adresses IPv4 non-loopback des interfaces réseau.
///
/// Chaque adresse n'apparaît qu'une fois, dans l'ordre rendu par le système.
/// Retourne une liste vide si les interfaces ne peuvent pas être lues.
pub fn list_ipv4_interfaces() -> Vec<Ipv4Addr> {
    let interfaces = match get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            warn!("Failed to list network interfaces: {}", e);
            return Vec::new();
        }
    };

    let mut result = Vec::new();
    for iface in interfaces {
        if let IpAddr::V4(ipv4) = iface.ip() {
            if !ipv4.is_loopback() && !result.contains(&ipv4) {
                result.push(ipv4);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_guess_local_ip_is_specified() {
        let ip = guess_local_ip();
        assert!(!ip.is_unspecified(), "Should not return 0.0.0.0");
    }

    #[test]
    fn test_list_ipv4_interfaces_no_loopback() {
        for ip in list_ipv4_interfaces() {
            assert!(!ip.is_loopback(), "Loopback addresses should be filtered out");
        }
    }

    #[test]
    fn test_list_ipv4_interfaces_no_duplicates() {
        let ips = list_ipv4_interfaces();
        let unique: HashSet<_> = ips.iter().collect();
        assert_eq!(ips.len(), unique.len(), "No duplicate IPs should exist");
    }
}
