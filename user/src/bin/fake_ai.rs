//! 模拟 AI：根据问题里的关键词挑一句回答。

#![no_std]
#![no_main]

#[macro_use]
extern crate user_lib;

#[no_mangle]
fn main(argc: usize, argv: &[&str]) -> i32 {
    if argc < 2 {
        return 0;
    }
    let prompt = argv[1];
    if prompt.contains("bonjour") {
        println!("Bonjour ! Comment puis-je vous aider aujourd'hui ?");
    } else if prompt.contains("heure") {
        println!("Il est l'heure de developper un OS !");
    } else if prompt == "aide" {
        println!("Commandes simulees : 'bonjour', 'heure', 'aide'.");
    } else {
        println!("Desole, je ne comprends pas la question.");
    }
    0
}
