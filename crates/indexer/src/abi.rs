//! Contract event vocabularies the pipeline decodes.
//!
//! All log decoding goes through these `sol!` declarations; the classifier
//! never hands raw topic/data bytes to downstream code.

#![allow(non_camel_case_types)]

use alloy_sol_types::sol;

sol! {
    /// ESIP-1: transfer of an ethscription by the emitting contract.
    event ethscriptions_protocol_TransferEthscription(
        address indexed recipient,
        bytes32 indexed ethscriptionId
    );

    /// ESIP-2: transfer that also pins the expected previous owner.
    event ethscriptions_protocol_TransferEthscriptionForPreviousOwner(
        address indexed previousOwner,
        address indexed recipient,
        bytes32 indexed ethscriptionId
    );
}

sol! {
    event PhunkOffered(bytes32 indexed phunkId, address indexed toAddress, uint256 minValue);
    event PhunkBought(bytes32 indexed phunkId, uint256 value, address indexed fromAddress, address indexed toAddress);
    event PhunkNoLongerForSale(bytes32 indexed phunkId);
    event PhunkBidEntered(bytes32 indexed phunkId, address indexed fromAddress, uint256 value);
    event PhunkBidWithdrawn(bytes32 indexed phunkId, address indexed fromAddress, uint256 value);
}

sol! {
    event AuctionCreated(bytes32 indexed hashId, address indexed owner, uint256 auctionId, uint256 startTime, uint256 endTime);
    event AuctionBid(bytes32 indexed hashId, uint256 auctionId, address sender, uint256 value, bool extended);
    event AuctionExtended(bytes32 indexed hashId, uint256 auctionId, uint256 endTime);
    event AuctionSettled(bytes32 indexed hashId, uint256 auctionId, address winner, uint256 amount);

    event AuctionTimeBufferUpdated(uint256 timeBuffer);
    event AuctionReservePriceUpdated(uint256 reservePrice);
    event AuctionMinBidIncrementPercentageUpdated(uint256 minBidIncrementPercentage);
    event AuctionDurationUpdated(uint256 duration);
}

sol! {
    event PointsAdded(address indexed user, uint256 amount);
}

sol! {
    event HashLocked(address indexed prevOwner, bytes32 indexed hashId, uint256 nonce, uint256 value);
    event HashUnlocked(address indexed prevOwner, bytes32 indexed hashId);
}
