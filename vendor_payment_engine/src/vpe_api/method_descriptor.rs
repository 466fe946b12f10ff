//! Static descriptions of the five payment methods. A single [`PaymentGateway`](super::gateway::PaymentGateway)
//! implementation serves every method; only the descriptor differs.
use crate::db_types::PaymentMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub method: PaymentMethod,
    pub display_name: &'static str,
    /// Brand colour, as a CSS hex string.
    pub color: &'static str,
    pub description: &'static str,
    /// Label shown next to the vendor's account number on the payment page.
    pub account_label: &'static str,
    /// Step-by-step payment instructions, in order.
    pub instructions: &'static [&'static str],
    /// Whether the payment page lists the vendor's full bank details.
    pub show_bank_details: bool,
}

pub const BKASH: MethodDescriptor = MethodDescriptor {
    method: PaymentMethod::Bkash,
    display_name: "bKash",
    color: "#E2136E",
    description: "Pay securely using your bKash mobile wallet",
    account_label: "bKash Account Number",
    instructions: &[
        "Open your bKash app on your phone",
        "Select \"Send Money\"",
        "Enter the bKash number shown below",
        "Send the exact amount shown",
        "Enter your transaction ID in the form below",
        "Click Submit to complete your order",
    ],
    show_bank_details: false,
};

pub const NAGAD: MethodDescriptor = MethodDescriptor {
    method: PaymentMethod::Nagad,
    display_name: "Nagad",
    color: "#EB5628",
    description: "Pay securely using your Nagad mobile wallet",
    account_label: "Nagad Account Number",
    instructions: &[
        "Open your Nagad app on your phone",
        "Select \"Send Money\"",
        "Enter the Nagad number shown below",
        "Send the exact amount shown",
        "Enter your transaction ID in the form below",
        "Click Submit to complete your order",
    ],
    show_bank_details: false,
};

pub const ROCKET: MethodDescriptor = MethodDescriptor {
    method: PaymentMethod::Rocket,
    display_name: "Rocket",
    color: "#8C3A9B",
    description: "Pay securely using your Rocket mobile wallet",
    account_label: "Rocket Account Number",
    instructions: &[
        "Open your Rocket app on your phone",
        "Select \"Send Money\" or \"Cash Out\"",
        "Enter the Rocket number shown below",
        "Send the exact amount shown",
        "Enter your transaction ID in the form below",
        "Click Submit to complete your order",
    ],
    show_bank_details: false,
};

pub const UPAY: MethodDescriptor = MethodDescriptor {
    method: PaymentMethod::Upay,
    display_name: "Upay",
    color: "#FFC20E",
    description: "Pay securely using your Upay mobile wallet",
    account_label: "Upay Account Number",
    instructions: &[
        "Open your Upay app on your phone",
        "Select \"Send Money\"",
        "Enter the Upay number shown below",
        "Send the exact amount shown",
        "Enter your transaction ID in the form below",
        "Click Submit to complete your order",
    ],
    show_bank_details: false,
};

pub const BANK_TRANSFER: MethodDescriptor = MethodDescriptor {
    method: PaymentMethod::Bank,
    display_name: "Bank Transfer",
    color: "#0066CC",
    description: "Pay via bank transfer",
    account_label: "Bank Account Details",
    instructions: &[
        "Transfer the exact amount to the bank account below",
        "Use your Order Number as the reference",
        "Take a screenshot or note the transaction reference number",
        "Enter the transaction/reference number in the form below",
        "Your order will be processed after payment verification",
    ],
    show_bank_details: true,
};

impl MethodDescriptor {
    pub fn for_method(method: PaymentMethod) -> &'static MethodDescriptor {
        match method {
            PaymentMethod::Bkash => &BKASH,
            PaymentMethod::Nagad => &NAGAD,
            PaymentMethod::Rocket => &ROCKET,
            PaymentMethod::Upay => &UPAY,
            PaymentMethod::Bank => &BANK_TRANSFER,
        }
    }

    /// The CSRF action name that protects payment submissions for this method.
    pub fn submit_action(&self) -> String {
        format!("vpg_{}_nonce", self.method)
    }
}
